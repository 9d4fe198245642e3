use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Transformer;

/// [`Transformer`] backed by an external program, invoked as
/// `program <input> <output>`. A nonzero exit status is a failure.
pub struct CommandTransformer {
    program: PathBuf,
}

impl CommandTransformer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Transformer for CommandTransformer {
    async fn transform(&self, input: &Path, output: &Path) -> Result<()> {
        debug!(program = %self.program.display(), input = %input.display(), "Invoking transformer");

        let status = tokio::process::Command::new(&self.program)
            .arg(input)
            .arg(output)
            .status()
            .await
            .with_context(|| {
                format!("failed to launch transformer {}", self.program.display())
            })?;

        if !status.success() {
            bail!("transformer exited with {status}");
        }

        Ok(())
    }
}
