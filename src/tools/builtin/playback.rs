use std::sync::Arc;

use crate::error::ToolError;
use crate::player::{LocalPlayer, PlayOutcome};
use crate::tools::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

pub struct PlayMp3LocalTool {
    pub player: Arc<LocalPlayer>,
}

#[async_trait]
impl Tool for PlayMp3LocalTool {
    fn name(&self) -> &str {
        "play_mp3_local"
    }
    fn description(&self) -> &str {
        "Download an MP3 and play locally on the host (debug)"
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL of the MP3 to download and play"
                }
            },
            "required": ["url"]
        })
    }
    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let Some(url) = params["url"].as_str().map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(ToolError::Other("missing url".into()).into_response());
        };

        info!("play_mp3_local: {}", url);
        let response = match self.player.play(url).await {
            Ok(PlayOutcome::Started { file, player }) => json!({
                "success": true,
                "url": url,
                "file": file.display().to_string(),
                "player": player,
            }),
            Ok(PlayOutcome::DownloadFailed(status)) => {
                ToolError::DownloadFail(status.as_u16()).into_response()
            }
            Err(e) => {
                warn!("play_mp3_local failed: {:#}", e);
                ToolError::from(e).into_response()
            }
        };
        Ok(response)
    }
}
