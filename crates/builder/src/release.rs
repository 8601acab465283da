//! Release output reading
//!
//! Runs the final buildpack's `release` script and parses its stdout.
//! Every failure mode here maps to exit code 224.

use crate::buildpack::{Buildpack, Script};
use crate::script::{ScriptInvoker, ScriptOutcome};
use stager_errors::{Result, StagingError};
use stager_types::BuildpackRelease;
use std::path::Path;

/// Run `bin/release <build-dir>` and parse the document it prints.
///
/// # Errors
///
/// Returns `NoReleaseScript` when the script is missing or not
/// executable, `ReleaseFailed` when it exits non-zero, and
/// `ReleaseOutputInvalid` when its output does not parse.
pub(crate) async fn read_release(
    invoker: &dyn ScriptInvoker,
    buildpack: &Buildpack,
    build_dir: &Path,
) -> Result<BuildpackRelease> {
    let args = vec![build_dir.display().to_string()];
    match invoker
        .invoke(buildpack, Script::Release, &args, build_dir)
        .await?
    {
        ScriptOutcome::Ok { stdout } => BuildpackRelease::from_yaml(&stdout).map_err(|err| {
            StagingError::ReleaseOutputInvalid {
                message: err.to_string(),
            }
            .into()
        }),
        ScriptOutcome::Missing | ScriptOutcome::NotExecutable => {
            Err(StagingError::NoReleaseScript {
                key: buildpack.key.clone(),
            }
            .into())
        }
        ScriptOutcome::Failed { status } => Err(StagingError::ReleaseFailed {
            message: format!(
                "{} exited with status {}",
                buildpack.key,
                status.map_or_else(|| "unknown".to_string(), |code| code.to_string())
            ),
        }
        .into()),
    }
}
