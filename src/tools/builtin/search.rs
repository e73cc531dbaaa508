use std::sync::Arc;

use crate::error::ToolError;
use crate::music::Resolver;
use crate::tools::builtin::display_text;
use crate::tools::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

pub struct SearchMusicTool {
    pub resolver: Arc<Resolver>,
}

#[async_trait]
impl Tool for SearchMusicTool {
    fn name(&self) -> &str {
        "search_music"
    }
    fn description(&self) -> &str {
        "Search a song by text (song name and optional artist) and return a playable URL"
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Song name or free-form text"
                },
                "artist": {
                    "type": "string",
                    "description": "Optional artist name"
                }
            },
            "required": ["query"]
        })
    }
    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let Some(query) = params["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
        else {
            return Ok(ToolError::EmptyQuery.into_response());
        };
        let artist = params["artist"].as_str().map(str::trim).unwrap_or_default();

        info!("search_music: query='{}' artist='{}'", query, artist);
        let playback = self.resolver.resolve(query, Some(artist)).await;

        Ok(json!({
            "success": true,
            "query": query,
            "artist": artist,
            "playback": playback,
            "display_text": display_text(query, Some(artist)),
        }))
    }
}
