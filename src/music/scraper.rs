//! Heuristics for spotting a cached MP3 reference in upstream responses.
//!
//! The upstream service does not document where (or whether) it exposes the
//! cached file, so matching lives behind [`MediaPathScraper`] and a miss is
//! never an error.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static CACHE_MP3_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/music_cache/[0-9a-f]{32}\.mp3").unwrap());

pub trait MediaPathScraper: Send + Sync {
    /// First media path found in `text`, if any.
    fn extract_media_path(&self, text: &str) -> Option<String>;
}

/// Matches `/music_cache/<32 hex>.mp3`, case-insensitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheMp3Scraper;

impl MediaPathScraper for CacheMp3Scraper {
    fn extract_media_path(&self, text: &str) -> Option<String> {
        CACHE_MP3_PATH.find(text).map(|m| m.as_str().to_string())
    }
}

/// Depth-first search for the first string leaf ending in `.mp3`.
pub fn find_mp3_leaf(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if s.ends_with(".mp3") => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(find_mp3_leaf),
        Value::Object(map) => map.values().find_map(find_mp3_leaf),
        _ => None,
    }
}
