//! Transform stage: a fixed-size worker pool reduces raw payloads into
//! normalized per-day records via a pluggable [`Transformer`].

mod builtin;
mod command;
mod pool;

pub use builtin::BuiltinTransformer;
pub use command::CommandTransformer;
pub use pool::{default_workers, run_pool};

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Reduces one city's raw payload into a normalized record.
///
/// Contract: read the raw payload at `input`, write a normalized record to
/// `output`, or fail. A failure drops the city from the pipeline; it is
/// never retried.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, input: &Path, output: &Path) -> Result<()>;
}
