use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A remote source of raw forecast payloads, looked up by city key.
///
/// The fetch stage is polymorphic over this trait so tests can substitute
/// an in-memory source.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch(&self, city: &str) -> Result<Value>;
}
