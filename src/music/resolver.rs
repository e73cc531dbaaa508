use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::music::scraper::{find_mp3_leaf, CacheMp3Scraper, MediaPathScraper};
use crate::music::url::build_stream_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackKind {
    Mp3,
    Pcm,
}

/// Which strategy produced a [`PlaybackResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSource {
    PcmProbe,
    SearchApi,
    FallbackPcm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackResult {
    #[serde(rename = "type")]
    pub kind: PlaybackKind,
    pub url: String,
    pub source: PlaybackSource,
}

impl PlaybackResult {
    fn mp3(url: String, source: PlaybackSource) -> Self {
        Self {
            kind: PlaybackKind::Mp3,
            url,
            source,
        }
    }
}

/// Turns a song query into something playable.
///
/// Strategies run one after another and stop at the first hit: probe the PCM
/// stream headers, probe the start of the PCM stream body, ask the search API.
/// When all of them come up empty the raw PCM stream URL is returned, so
/// [`Resolver::resolve`] never fails.
pub struct Resolver {
    config: Arc<Config>,
    http: reqwest::Client,
    scraper: Arc<dyn MediaPathScraper>,
}

impl Resolver {
    pub fn new(config: Arc<Config>, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            scraper: Arc::new(CacheMp3Scraper),
        }
    }

    pub fn with_scraper(mut self, scraper: Arc<dyn MediaPathScraper>) -> Self {
        self.scraper = scraper;
        self
    }

    pub fn stream_url(&self, song: &str, artist: Option<&str>) -> String {
        build_stream_url(&self.config.base_url, song, artist)
    }

    pub async fn resolve(&self, song: &str, artist: Option<&str>) -> PlaybackResult {
        let stream_url = self.stream_url(song, artist);

        if let Some(path) = absorb("stream headers", self.probe_headers(&stream_url).await) {
            info!("Resolved '{}' from stream headers", song);
            return PlaybackResult::mp3(self.absolutize(&path), PlaybackSource::PcmProbe);
        }

        if let Some(path) = absorb("stream body", self.probe_body(&stream_url).await) {
            info!("Resolved '{}' from stream body", song);
            return PlaybackResult::mp3(self.absolutize(&path), PlaybackSource::PcmProbe);
        }

        if let Some(url) = absorb("search api", self.search(song, artist).await) {
            info!("Resolved '{}' via search API", song);
            return PlaybackResult::mp3(url, PlaybackSource::SearchApi);
        }

        info!("No cached MP3 for '{}', falling back to PCM stream", song);
        PlaybackResult {
            kind: PlaybackKind::Pcm,
            url: stream_url,
            source: PlaybackSource::FallbackPcm,
        }
    }

    async fn probe_headers(&self, stream_url: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .http
            .head(stream_url)
            .timeout(self.config.http_timeout())
            .send()
            .await?;

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.clone());
        }
        let dump = serde_json::to_string(&headers)?;
        debug!(status = %response.status(), "HEAD probe headers: {}", dump);

        Ok(self.scraper.extract_media_path(&dump))
    }

    async fn probe_body(&self, stream_url: &str) -> anyhow::Result<Option<String>> {
        let mut response = self
            .http
            .get(stream_url)
            .timeout(self.config.http_timeout())
            .send()
            .await?;

        // The endpoint streams audio indefinitely; stop once enough is buffered.
        let limit = self.config.probe_body_limit;
        let max_bytes = limit.saturating_mul(4);
        let mut body = Vec::new();
        while body.len() < max_bytes {
            match response.chunk().await? {
                Some(chunk) => body.extend_from_slice(&chunk),
                None => break,
            }
        }

        let head: String = String::from_utf8_lossy(&body).chars().take(limit).collect();
        debug!(status = %response.status(), bytes = body.len(), "GET probe read stream prefix");

        Ok(self.scraper.extract_media_path(&head))
    }

    async fn search(&self, song: &str, artist: Option<&str>) -> anyhow::Result<Option<String>> {
        let mut request = self
            .http
            .get(self.config.search_url())
            .query(&[("q", song)])
            .timeout(self.config.http_timeout());
        if let Some(artist) = artist.filter(|a| !a.is_empty()) {
            request = request.query(&[("artist", artist)]);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "Search API returned non-200");
            return Ok(None);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
        let text = response.text().await?;

        if is_json {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => {
                    if let Some(leaf) = find_mp3_leaf(&value) {
                        return Ok(Some(self.absolutize(leaf)));
                    }
                }
                Err(e) => debug!("Search API sent unparsable JSON: {}", e),
            }
        }

        Ok(self
            .scraper
            .extract_media_path(&text)
            .map(|path| self.absolutize(&path)))
    }

    fn absolutize(&self, path: &str) -> String {
        if path.starts_with('/') {
            return format!("{}{}", self.config.base_url, path);
        }
        match reqwest::Url::parse(path) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => path.to_string(),
            _ => format!("{}/{}", self.config.base_url, path),
        }
    }
}

/// Upstream failures only mean "this strategy found nothing".
fn absorb(strategy: &str, outcome: anyhow::Result<Option<String>>) -> Option<String> {
    match outcome {
        Ok(found) => {
            if found.is_none() {
                debug!("No media path from {}", strategy);
            }
            found
        }
        Err(e) => {
            debug!("Ignoring {} failure: {:#}", strategy, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CACHE_PATH: &str = "/music_cache/0123456789abcdef0123456789abcdef.mp3";

    fn resolver_for(server: &MockServer) -> Resolver {
        let config = Config::with_base_url(&server.uri()).unwrap();
        Resolver::new(Arc::new(config), reqwest::Client::new())
    }

    #[tokio::test]
    async fn header_hit_short_circuits_remaining_strategies() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/stream_pcm"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-cached-file", CACHE_PATH))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stream_pcm"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve("Hello", Some("Adele")).await;
        assert_eq!(
            result,
            PlaybackResult {
                kind: PlaybackKind::Mp3,
                url: format!("{}{}", server.uri(), CACHE_PATH),
                source: PlaybackSource::PcmProbe,
            }
        );
    }

    #[tokio::test]
    async fn body_probe_finds_cache_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream_pcm"))
            .and(query_param("song", "Hello"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("<a href=\"{}\">cached</a>", CACHE_PATH)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve("Hello", None).await;
        assert_eq!(result.source, PlaybackSource::PcmProbe);
        assert_eq!(result.url, format!("{}{}", server.uri(), CACHE_PATH));
    }

    #[tokio::test]
    async fn head_timeout_still_probes_body() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/stream_pcm"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-cached-file", CACHE_PATH)
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stream_pcm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CACHE_PATH))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = Config {
            http_timeout_secs: 1,
            ..Config::with_base_url(&server.uri()).unwrap()
        };
        let resolver = Resolver::new(Arc::new(config), reqwest::Client::new());

        let result = resolver.resolve("Hello", None).await;
        assert_eq!(result.source, PlaybackSource::PcmProbe);
        assert_eq!(result.url, format!("{}{}", server.uri(), CACHE_PATH));
    }

    #[tokio::test]
    async fn body_probe_ignores_matches_past_the_limit() {
        let server = MockServer::start().await;
        let padded = format!("{}{}", "x".repeat(5000), CACHE_PATH);
        Mock::given(method("GET"))
            .and(path("/stream_pcm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(padded))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve("Hello", None).await;
        assert_eq!(result.source, PlaybackSource::FallbackPcm);
    }

    #[tokio::test]
    async fn search_json_leaf_is_prefixed_with_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Hello"))
            .and(query_param("artist", "Adele"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"title": "Hello", "file": "/media/hello.mp3"}]
            })))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve("Hello", Some("Adele")).await;
        assert_eq!(
            result,
            PlaybackResult {
                kind: PlaybackKind::Mp3,
                url: format!("{}/media/hello.mp3", server.uri()),
                source: PlaybackSource::SearchApi,
            }
        );
    }

    #[tokio::test]
    async fn search_json_absolute_url_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"url": "https://cdn.example/hello.mp3"})),
            )
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve("Hello", None).await;
        assert_eq!(result.url, "https://cdn.example/hello.mp3");
        assert_eq!(result.source, PlaybackSource::SearchApi);
    }

    #[tokio::test]
    async fn search_text_falls_back_to_pattern() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("found: {}", CACHE_PATH)),
            )
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve("Hello", None).await;
        assert_eq!(result.url, format!("{}{}", server.uri(), CACHE_PATH));
        assert_eq!(result.source, PlaybackSource::SearchApi);
    }

    #[tokio::test]
    async fn search_non_200_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string(CACHE_PATH))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve("Hello", None).await;
        assert_eq!(result.source, PlaybackSource::FallbackPcm);
    }

    #[tokio::test]
    async fn nothing_found_falls_back_to_exact_stream_url() {
        let server = MockServer::start().await;
        let resolver = resolver_for(&server);

        let result = resolver.resolve("Nơi này có anh", Some("Sơn Tùng")).await;
        assert_eq!(
            result,
            PlaybackResult {
                kind: PlaybackKind::Pcm,
                url: build_stream_url(&server.uri(), "Nơi này có anh", Some("Sơn Tùng")),
                source: PlaybackSource::FallbackPcm,
            }
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_still_yields_fallback() {
        let config = Config::with_base_url("http://127.0.0.1:1").unwrap();
        let resolver = Resolver::new(Arc::new(config), reqwest::Client::new());

        let result = resolver.resolve("Hello", None).await;
        assert_eq!(result.kind, PlaybackKind::Pcm);
        assert_eq!(
            result.url,
            "http://127.0.0.1:1/stream_pcm?song=Hello&artist="
        );
    }

    struct AlwaysFinds;

    impl MediaPathScraper for AlwaysFinds {
        fn extract_media_path(&self, _text: &str) -> Option<String> {
            Some("/custom/track.mp3".to_string())
        }
    }

    #[tokio::test]
    async fn scraper_is_swappable() {
        let server = MockServer::start().await;
        let resolver = resolver_for(&server).with_scraper(Arc::new(AlwaysFinds));

        let result = resolver.resolve("Hello", None).await;
        assert_eq!(result.url, format!("{}/custom/track.mp3", server.uri()));
        assert_eq!(result.source, PlaybackSource::PcmProbe);
    }

    #[test]
    fn playback_serializes_with_wire_names() {
        let result = PlaybackResult {
            kind: PlaybackKind::Pcm,
            url: "http://host/stream_pcm?song=a&artist=".into(),
            source: PlaybackSource::FallbackPcm,
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "pcm",
                "url": "http://host/stream_pcm?song=a&artist=",
                "source": "fallback_pcm"
            })
        );
    }
}
