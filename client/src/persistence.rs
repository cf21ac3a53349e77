//! Fire-and-forget storage of finished game results

use log::{info, warn};
use serde::{Deserialize, Serialize};
use shared::{GameMode, PlayerId};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub player_id: PlayerId,
    pub score: u32,
    pub mode: GameMode,
}

/// Destination for finished game results
///
/// Implementations must not block and never report failures back to the caller.
pub trait ResultStore {
    fn record(&self, result: GameResult);
}

/// Appends one JSON object per line to a file
pub struct JsonLinesStore {
    path: PathBuf,
    runtime: Handle,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>, runtime: Handle) -> Self {
        Self {
            path: path.into(),
            runtime,
        }
    }
}

impl ResultStore for JsonLinesStore {
    fn record(&self, result: GameResult) {
        let path = self.path.clone();
        self.runtime.spawn(async move {
            match append_result(&path, &result).await {
                Ok(()) => info!(
                    "Saved score {} for {} to {}",
                    result.score,
                    result.player_id,
                    path.display()
                ),
                Err(e) => warn!("Failed to save result to {}: {}", path.display(), e),
            }
        });
    }
}

pub(crate) async fn append_result(
    path: &Path,
    result: &GameResult,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut line = serde_json::to_string(result)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
