use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    /// Upstream music service, without a trailing slash
    pub base_url: String,
    pub http_timeout_secs: u64,
    pub stt_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Number of body characters scanned when probing the PCM stream
    pub probe_body_limit: usize,
}

pub const DEFAULT_BASE_URL: &str = "http://www.xiaozhishop.xyz:5005";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 6;
const DEFAULT_STT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROBE_BODY_LIMIT: usize = 4000;

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            stt_timeout_secs: DEFAULT_STT_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            probe_body_limit: DEFAULT_PROBE_BODY_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        let base_url = normalize_base_url(
            &env::var("DJ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )?;

        Ok(Config {
            base_url,
            http_timeout_secs: env::var("DJ_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            stt_timeout_secs: env::var("DJ_STT_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_STT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_STT_TIMEOUT_SECS),
            download_timeout_secs: env::var("DJ_DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_DOWNLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            probe_body_limit: env::var("DJ_PROBE_BODY_LIMIT")
                .unwrap_or_else(|_| DEFAULT_PROBE_BODY_LIMIT.to_string())
                .parse()
                .unwrap_or(DEFAULT_PROBE_BODY_LIMIT),
        })
    }

    /// Same defaults, pointed at another upstream.
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn stt_timeout(&self) -> Duration {
        Duration::from_secs(self.stt_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Fallback transcription endpoint hosted by the music service.
    pub fn default_stt_url(&self) -> String {
        format!("{}/stt", self.base_url)
    }

    pub fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| anyhow::anyhow!("DJ_BASE_URL '{}' is not a valid URL: {}", raw, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow::anyhow!(
            "DJ_BASE_URL must use http or https, got '{}'",
            parsed.scheme()
        ));
    }
    Ok(trimmed.to_string())
}
