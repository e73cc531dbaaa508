use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::ToolError;
use crate::music::Resolver;
use crate::stt::SttClient;
use crate::tools::builtin::display_text;
use crate::tools::Tool;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tracing::{info, warn};

const DEFAULT_AUDIO_FILENAME: &str = "req.wav";

#[derive(Debug, Serialize)]
struct SttAttempt {
    endpoint: String,
    ok: bool,
}

pub struct SearchMusicByVoiceTool {
    pub config: Arc<Config>,
    pub resolver: Arc<Resolver>,
    pub stt: Arc<SttClient>,
    /// Where the uploaded audio is staged; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl SearchMusicByVoiceTool {
    fn stage_audio(&self, audio: &[u8], filename: &str) -> std::io::Result<NamedTempFile> {
        let suffix = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_else(|| ".wav".to_string());

        let mut builder = tempfile::Builder::new();
        builder.prefix("aidj-voice-").suffix(&suffix);
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(audio)?;
        file.flush()?;
        Ok(file)
    }

    /// Try each endpoint in order until one produces a transcript.
    async fn transcribe(
        &self,
        audio_path: &Path,
        filename: &str,
        stt_url: Option<&str>,
    ) -> (Option<String>, Vec<SttAttempt>) {
        let candidates: Vec<String> = stt_url
            .map(str::to_string)
            .into_iter()
            .chain(std::iter::once(self.config.default_stt_url()))
            .collect();

        let mut attempts = Vec::with_capacity(candidates.len());
        for endpoint in candidates {
            let transcript = self.stt.transcribe(audio_path, &endpoint, filename).await;
            attempts.push(SttAttempt {
                endpoint,
                ok: transcript.is_some(),
            });
            if transcript.is_some() {
                return (transcript, attempts);
            }
        }
        (None, attempts)
    }
}

fn decode_audio(params: &Value) -> Result<Vec<u8>, ToolError> {
    let encoded = params["audio_base64"]
        .as_str()
        .or_else(|| params["audio_b64"].as_str())
        .ok_or_else(|| ToolError::InvalidBase64("audio_base64 must be a string".into()))?;

    let cleaned: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let audio = general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| ToolError::InvalidBase64(e.to_string()))?;
    if audio.is_empty() {
        return Err(ToolError::InvalidBase64("audio payload is empty".into()));
    }
    Ok(audio)
}

#[async_trait]
impl Tool for SearchMusicByVoiceTool {
    fn name(&self) -> &str {
        "search_music_by_voice"
    }
    fn description(&self) -> &str {
        "Search a song by voice (base64 audio). Returns transcript and a playable URL"
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "audio_base64": {
                    "type": "string",
                    "description": "Base64-encoded WAV audio (mono, 16 kHz recommended)"
                },
                "audio_filename": {
                    "type": "string",
                    "description": "Optional filename hint, defaults to req.wav"
                },
                "stt_url": {
                    "type": "string",
                    "description": "Optional external STT endpoint to try first"
                }
            },
            "required": ["audio_base64"]
        })
    }
    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let audio = match decode_audio(&params) {
            Ok(audio) => audio,
            Err(e) => {
                warn!("search_music_by_voice: {}", e);
                return Ok(e.into_response());
            }
        };
        let filename = params["audio_filename"]
            .as_str()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_AUDIO_FILENAME);
        let stt_url = params["stt_url"]
            .as_str()
            .map(str::trim)
            .filter(|u| !u.is_empty());

        // Removed on drop, so every return below cleans up.
        let staged = match self.stage_audio(&audio, filename) {
            Ok(file) => file,
            Err(e) => {
                return Ok(ToolError::Other(format!("could not stage audio: {}", e)).into_response())
            }
        };

        info!("search_music_by_voice: {} bytes of audio", audio.len());
        let (transcript, attempts) = self.transcribe(staged.path(), filename, stt_url).await;
        if let Err(e) = staged.close() {
            warn!("Failed to remove staged audio: {}", e);
        }

        let debug = json!({ "stt": attempts });
        let Some(transcript) = transcript else {
            return Ok(ToolError::SttFail { debug }.into_response());
        };

        info!("search_music_by_voice: transcript='{}'", transcript);
        let playback = self.resolver.resolve(&transcript, None).await;

        Ok(json!({
            "success": true,
            "display_text": display_text(&transcript, None),
            "transcript": transcript,
            "playback": playback,
            "debug": debug,
        }))
    }
}
