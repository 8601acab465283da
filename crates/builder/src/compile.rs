//! The supply/finalize/compile pipeline
//!
//! Single-buildpack mode invokes `compile` directly. Multi-buildpack mode
//! runs every buildpack's `supply` in declared order (the final one only
//! when it ships the script), then `finalize` on the last buildpack, or
//! `compile` with a compatibility warning when it has no `finalize`.

use crate::buildpack::{Buildpack, Script};
use crate::plan::StagingPlan;
use crate::script::{ScriptInvoker, ScriptOutcome};
use stager_errors::{Error, Result, StagingError};
use stager_events::{EventEmitter, EventSender};
use std::path::Path;

const MULTI_BUILDPACK_WARNING: &str = "Warning: the last buildpack is not compatible with multi-buildpack apps and cannot make use of any dependencies supplied by the buildpacks specified before it";

pub(crate) struct CompileDriver<'a> {
    pub invoker: &'a dyn ScriptInvoker,
    pub events: &'a Option<EventSender>,
}

#[derive(Debug)]
pub(crate) struct CompileOutcome {
    /// Whether any supply script ran (and `deps/` should ship)
    pub supplied: bool,
}

impl CompileDriver<'_> {
    /// Run the compilation pipeline for the selected buildpacks.
    ///
    /// # Errors
    ///
    /// Returns `SupplyScriptMissing`/`SupplyFailed` (225) for supply-phase
    /// problems and `CompileFailed` (223) when compile or finalize does
    /// not succeed.
    pub async fn compile(
        &self,
        plan: &StagingPlan,
        build_dir: &Path,
        cache_dir: &Path,
        deps_dir: &Path,
    ) -> Result<CompileOutcome> {
        if !plan.is_multi() {
            self.run_compile(plan.final_buildpack(), build_dir, cache_dir)
                .await?;
            return Ok(CompileOutcome { supplied: false });
        }

        let mut supplied = false;
        let final_index = plan.final_index();
        for (index, buildpack) in plan.buildpacks().iter().enumerate() {
            let is_final = index == final_index;
            if !buildpack.has_script(Script::Supply) {
                if is_final {
                    // The final buildpack supplies opportunistically.
                    continue;
                }
                self.events
                    .emit_error(format!("supply script missing from {}", buildpack.key));
                return Err(StagingError::SupplyScriptMissing {
                    key: buildpack.key.clone(),
                }
                .into());
            }

            let index_dir = deps_dir.join(index.to_string());
            tokio::fs::create_dir_all(&index_dir)
                .await
                .map_err(|e| Error::io_with_path(&e, &index_dir))?;

            let args = vec![
                build_dir.display().to_string(),
                cache_dir.display().to_string(),
                deps_dir.display().to_string(),
                index.to_string(),
            ];
            match self
                .invoker
                .invoke(buildpack, Script::Supply, &args, build_dir)
                .await?
            {
                ScriptOutcome::Ok { .. } => supplied = true,
                ScriptOutcome::Missing | ScriptOutcome::NotExecutable => {
                    if is_final {
                        continue;
                    }
                    self.events
                        .emit_error(format!("supply script missing from {}", buildpack.key));
                    return Err(StagingError::SupplyScriptMissing {
                        key: buildpack.key.clone(),
                    }
                    .into());
                }
                ScriptOutcome::Failed { .. } => {
                    self.events
                        .emit_error(format!("supply script failed for {}", buildpack.key));
                    return Err(StagingError::SupplyFailed {
                        message: buildpack.key.clone(),
                    }
                    .into());
                }
            }
        }

        let final_buildpack = plan.final_buildpack();
        if final_buildpack.has_script(Script::Finalize) {
            let args = vec![
                build_dir.display().to_string(),
                cache_dir.display().to_string(),
                deps_dir.display().to_string(),
                final_index.to_string(),
            ];
            match self
                .invoker
                .invoke(final_buildpack, Script::Finalize, &args, build_dir)
                .await?
            {
                ScriptOutcome::Ok { .. } => {}
                _ => {
                    self.events
                        .emit_error(format!("finalize script failed for {}", final_buildpack.key));
                    return Err(StagingError::CompileFailed {
                        message: final_buildpack.key.clone(),
                    }
                    .into());
                }
            }
        } else {
            self.events.emit_warning(MULTI_BUILDPACK_WARNING);
            // Deps are deliberately not passed to compile.
            self.run_compile(final_buildpack, build_dir, cache_dir)
                .await?;
        }

        Ok(CompileOutcome { supplied })
    }

    async fn run_compile(
        &self,
        buildpack: &Buildpack,
        build_dir: &Path,
        cache_dir: &Path,
    ) -> Result<()> {
        let args = vec![
            build_dir.display().to_string(),
            cache_dir.display().to_string(),
        ];
        match self
            .invoker
            .invoke(buildpack, Script::Compile, &args, build_dir)
            .await?
        {
            ScriptOutcome::Ok { .. } => Ok(()),
            _ => {
                self.events
                    .emit_error(format!("compile script failed for {}", buildpack.key));
                Err(StagingError::CompileFailed {
                    message: buildpack.key.clone(),
                }
                .into())
            }
        }
    }
}
