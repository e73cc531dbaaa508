use std::path::Path;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{multipart, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;

/// Fields checked, in order, when an STT endpoint answers with JSON.
const TRANSCRIPT_FIELDS: [&str; 3] = ["text", "transcript", "data"];

pub struct SttClient {
    config: Arc<Config>,
    http: reqwest::Client,
}

impl SttClient {
    pub fn new(config: Arc<Config>, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Upload `audio_path` to `endpoint` and return the recognized text.
    ///
    /// Any failure (I/O, network, status, body) yields `None`.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        endpoint: &str,
        filename: &str,
    ) -> Option<String> {
        match self.try_transcribe(audio_path, endpoint, filename).await {
            Ok(text) => text.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("STT request to {} failed: {:#}", endpoint, e);
                None
            }
        }
    }

    async fn try_transcribe(
        &self,
        audio_path: &Path,
        endpoint: &str,
        filename: &str,
    ) -> anyhow::Result<Option<String>> {
        let audio = tokio::fs::read(audio_path).await?;
        let part = multipart::Part::bytes(audio).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        debug!(endpoint, filename, "Sending audio for transcription");
        let response = self
            .http
            .post(endpoint)
            .multipart(form)
            .timeout(self.config.stt_timeout())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            warn!(status = %response.status(), "STT endpoint {} rejected audio", endpoint);
            return Ok(None);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

        if is_json {
            let body: Value = response.json().await?;
            return Ok(transcript_from_json(&body));
        }

        Ok(Some(response.text().await?.trim().to_string()))
    }
}

fn transcript_from_json(body: &Value) -> Option<String> {
    TRANSCRIPT_FIELDS
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
