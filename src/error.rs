use serde_json::{json, Value};
use thiserror::Error;

/// Failures a tool reports back to the host inside a `success: false` envelope.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("invalid base64 audio: {0}")]
    InvalidBase64(String),
    #[error("no transcript from any STT endpoint")]
    SttFail { debug: Value },
    #[error("download failed with HTTP {0}")]
    DownloadFail(u16),
    #[error("{0}")]
    Other(String),
}

impl ToolError {
    pub fn code(&self) -> &str {
        match self {
            ToolError::EmptyQuery => "empty_query",
            ToolError::InvalidBase64(_) => "invalid_base64",
            ToolError::SttFail { .. } => "stt_fail",
            ToolError::DownloadFail(_) => "download_fail",
            ToolError::Other(message) => message,
        }
    }

    pub fn into_response(self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.code(),
        });
        match self {
            ToolError::InvalidBase64(detail) => {
                response["detail"] = json!(detail);
            }
            ToolError::SttFail { debug } => {
                response["debug"] = debug;
            }
            ToolError::DownloadFail(status) => {
                response["http"] = json!(status);
            }
            ToolError::EmptyQuery | ToolError::Other(_) => {}
        }
        response
    }
}

impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        ToolError::Other(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_carry_code_and_payload() {
        assert_eq!(
            ToolError::EmptyQuery.into_response(),
            json!({"success": false, "error": "empty_query"})
        );
        assert_eq!(
            ToolError::DownloadFail(404).into_response(),
            json!({"success": false, "error": "download_fail", "http": 404})
        );

        let invalid = ToolError::InvalidBase64("Invalid byte 45, offset 3.".into()).into_response();
        assert_eq!(invalid["error"], "invalid_base64");
        assert_eq!(invalid["detail"], "Invalid byte 45, offset 3.");

        let stt = ToolError::SttFail {
            debug: json!({"stt": []}),
        }
        .into_response();
        assert_eq!(stt["error"], "stt_fail");
        assert_eq!(stt["debug"], json!({"stt": []}));
    }

    #[test]
    fn other_errors_use_their_message_as_code() {
        let err: ToolError = anyhow::anyhow!("no player could be launched").into();
        assert_eq!(
            err.into_response(),
            json!({"success": false, "error": "no player could be launched"})
        );
    }
}
