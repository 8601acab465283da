//! Buildpack selection
//!
//! Polls each candidate's detect script in order until one accepts the
//! application. Skip-detect bypasses the polling entirely and keeps the
//! full candidate list for the supply phase.

use crate::buildpack::{Buildpack, Script};
use crate::config::Config;
use crate::plan::StagingPlan;
use crate::script::{ScriptInvoker, ScriptOutcome};
use stager_errors::{Result, StagingError};
use stager_events::{Event, EventEmitter, EventSender};

pub(crate) struct Detector<'a> {
    pub invoker: &'a dyn ScriptInvoker,
    pub events: &'a Option<EventSender>,
}

impl Detector<'_> {
    /// Select the buildpack sequence staging will compile with.
    ///
    /// # Errors
    ///
    /// Returns `NoAppDetected` (exit code 222) when every candidate's
    /// detect script is missing, unrunnable, or rejects the application.
    /// Under skip-detect a malformed buildpack directory is fatal, since
    /// every candidate is about to run required phases.
    pub async fn select(&self, config: &Config) -> Result<StagingPlan> {
        if config.skip_detect {
            let buildpacks = config
                .buildpack_order
                .iter()
                .map(|key| Buildpack::resolve(&config.buildpacks_dir, key))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            // No detect output exists to report under skip-detect.
            return Ok(StagingPlan::new(buildpacks, String::new()));
        }

        for key in &config.buildpack_order {
            self.events.emit(Event::DetectStarted { key: key.clone() });
            let buildpack = match Buildpack::resolve(&config.buildpacks_dir, key) {
                Ok(buildpack) => buildpack,
                Err(err) => {
                    self.events.emit_debug(err.to_string());
                    continue;
                }
            };

            let args = vec![config.build_dir.display().to_string()];
            match self
                .invoker
                .invoke(&buildpack, Script::Detect, &args, &config.build_dir)
                .await?
            {
                ScriptOutcome::Ok { stdout } => {
                    let detected_name = stdout.trim().to_string();
                    self.events.emit(Event::BuildpackSelected {
                        key: key.clone(),
                        detected_name: detected_name.clone(),
                    });
                    return Ok(StagingPlan::new(vec![buildpack], detected_name));
                }
                ScriptOutcome::Missing => {
                    self.events.emit_debug(format!(
                        "failed to find detect script: {}",
                        buildpack.script_path(Script::Detect).display()
                    ));
                }
                // The invoker already warned about a non-executable
                // script; a non-zero exit means "not my app". Both fall
                // through to the next candidate.
                ScriptOutcome::NotExecutable | ScriptOutcome::Failed { .. } => {}
            }
        }

        Err(StagingError::NoAppDetected.into())
    }
}
