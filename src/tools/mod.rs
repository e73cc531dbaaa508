use std::collections::HashMap;
use std::sync::Arc;
use serde_json::Value;
use async_trait::async_trait;

use crate::config::Config;
use crate::music::Resolver;
use crate::player::LocalPlayer;
use crate::stt::SttClient;

pub mod builtin;
pub mod executor;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    /// Returns the response envelope; tool-level failures are `success: false`
    /// values, `Err` is reserved for faults the host should see.
    async fn execute(&self, params: Value) -> anyhow::Result<Value>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry holding the three music tools, sharing one HTTP client.
    pub fn with_builtin(config: Arc<Config>, http: reqwest::Client) -> Self {
        let resolver = Arc::new(Resolver::new(config.clone(), http.clone()));
        let stt = Arc::new(SttClient::new(config.clone(), http.clone()));
        let player = Arc::new(LocalPlayer::new(config.clone(), http));

        let mut registry = Self::new();
        registry.register(Arc::new(builtin::search::SearchMusicTool {
            resolver: resolver.clone(),
        }));
        registry.register(Arc::new(builtin::voice::SearchMusicByVoiceTool {
            config,
            resolver,
            stt,
            scratch_dir: None,
        }));
        registry.register(Arc::new(builtin::playback::PlayMp3LocalTool { player }));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tools, sorted by name so listings are stable.
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }
}
