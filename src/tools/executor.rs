use std::sync::Arc;
use crate::tools::ToolRegistry;
use serde_json::Value;
use tracing::info;

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn execute(&self, name: &str, params: Value) -> anyhow::Result<Value> {
        let tool = self.registry.get(name)
            .ok_or_else(|| anyhow::anyhow!("Tool not found: {}", name))?;

        info!("Executing tool '{}'", name);
        let result = tool.execute(params).await?;
        info!(
            success = result["success"].as_bool().unwrap_or(false),
            "Tool '{}' finished", name
        );
        Ok(result)
    }
}
