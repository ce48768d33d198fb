//! `checkpoint` administration commands

use clap::Subcommand;
use tracing::info;

use super::CliError;
use crate::resume::CheckpointStore;
use crate::settings::Settings;

/// Checkpoint actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointAction {
    /// Print the stored continuation token
    Show,
    /// Delete the checkpoint so the next run starts from the oldest available logs
    Reset,
}

impl CheckpointAction {
    /// Execute against the stream configured in `settings`
    pub fn execute(&self, settings: &Settings) -> Result<(), CliError> {
        let store = CheckpointStore::new(&settings.logging.checkpoint_dir);
        let stream = &settings.logging.stream_type;
        println!("{}", self.apply(&store, stream)?);
        Ok(())
    }

    /// Apply the action and return the line to print
    pub fn apply(&self, store: &CheckpointStore, stream: &str) -> Result<String, CliError> {
        let path = store.path_for(stream);
        match self {
            CheckpointAction::Show => Ok(store
                .read(stream)?
                .unwrap_or_else(|| "no checkpoint".to_string())),
            CheckpointAction::Reset => {
                if store.delete(stream)? {
                    info!(path = %path.display(), "Checkpoint deleted");
                    Ok(format!("deleted {}", path.display()))
                } else {
                    Ok("no checkpoint".to_string())
                }
            }
        }
    }
}
