//! Delete command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::LecnavError;
use crate::vector_store::open_store;
use anyhow::Result;

/// Run the delete command.
pub async fn run_delete(source_id: &str, settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    let removed = store.delete_source(source_id).await?;
    if removed == 0 {
        Output::error(&format!("No indexed source with id '{}'", source_id));
        return Err(LecnavError::SourceNotFound(source_id.to_string()).into());
    }

    Output::success(&format!("Removed {} chunks for '{}'", removed, source_id));
    Ok(())
}
