//! Procfile reading
//!
//! An application may ship a `Procfile` mapping process-type names to
//! commands. Absence is fine; a file that is not a string-to-string
//! mapping is fatal.

use stager_errors::{Error, Result, StagingError};
use stager_types::ProcessTypes;
use std::path::Path;

/// Read `<build-dir>/Procfile` if present.
///
/// # Errors
///
/// Returns `ProcfileInvalid` when the file exists but is not a mapping of
/// strings to strings, and an I/O error when it cannot be read.
pub(crate) async fn read_procfile(build_dir: &Path) -> Result<Option<ProcessTypes>> {
    let path = build_dir.join("Procfile");
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::io_with_path(&err, &path)),
    };
    parse_procfile(&text).map(Some)
}

fn parse_procfile(text: &str) -> Result<ProcessTypes> {
    let invalid = |err: serde_yml::Error| -> Error {
        StagingError::ProcfileInvalid {
            message: err.to_string(),
        }
        .into()
    };
    let value: serde_yml::Value = serde_yml::from_str(text).map_err(invalid)?;
    if value.is_null() {
        // An empty Procfile declares no process types.
        return Ok(ProcessTypes::new());
    }
    serde_yml::from_value(value).map_err(invalid)
}
