//! Top-level staging orchestration

use crate::archive;
use crate::compile::CompileDriver;
use crate::config::Config;
use crate::detect::Detector;
use crate::layout::StagingTree;
use crate::metadata;
use crate::procfile;
use crate::release;
use crate::script::{CommandInvoker, ScriptInvoker};
use stager_errors::{Error, Result};
use stager_events::{Event, EventEmitter, EventSender};
use stager_types::{StagingInfo, StagingResult};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;

/// Runs the staging pipeline: detect, compile, release, reconcile,
/// package. One runner stages one application.
pub struct Runner {
    config: Config,
    event_sender: Option<EventSender>,
    invoker: Option<Arc<dyn ScriptInvoker>>,
    staging_root: Option<TempDir>,
}

impl EventEmitter for Runner {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Runner {
    /// Create a runner for one staging run
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            event_sender: None,
            invoker: None,
            staging_root: None,
        }
    }

    /// Set event sender for progress and diagnostics
    #[must_use]
    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Substitute the script invoker (tests inject fakes here)
    #[must_use]
    pub fn with_invoker(mut self, invoker: Arc<dyn ScriptInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Stage the application and produce the droplet, cache archive and
    /// result metadata.
    ///
    /// The private staging tree is removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns a typed staging error carrying the contract's exit code
    /// when any phase fails; see `stager_errors::StagingError`.
    pub async fn run(&mut self) -> Result<StagingResult> {
        let result = self.stage().await;
        self.cleanup();
        result
    }

    /// Remove the private staging tree. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        if let Some(root) = self.staging_root.take() {
            // Best effort; the root lives under the OS temp dir.
            let _ = root.close();
        }
    }

    async fn stage(&mut self) -> Result<StagingResult> {
        self.config.validate()?;
        self.emit(Event::StagingStarted {
            build_dir: self.config.build_dir.clone(),
        });

        let staging_root = tempfile::Builder::new().prefix("staging").tempdir()?;
        let contents_dir = staging_root.path().join("contents");
        let deps_dir = staging_root.path().join("deps");
        fs::create_dir_all(&contents_dir).await?;
        fs::create_dir_all(&deps_dir).await?;
        fs::create_dir_all(&self.config.build_artifacts_cache)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.config.build_artifacts_cache))?;
        self.staging_root = Some(staging_root);

        let invoker: Arc<dyn ScriptInvoker> = match &self.invoker {
            Some(invoker) => Arc::clone(invoker),
            None => Arc::new(CommandInvoker::new(self.event_sender.clone())),
        };

        let detector = Detector {
            invoker: invoker.as_ref(),
            events: &self.event_sender,
        };
        let plan = detector.select(&self.config).await?;

        let driver = CompileDriver {
            invoker: invoker.as_ref(),
            events: &self.event_sender,
        };
        let outcome = driver
            .compile(
                &plan,
                &self.config.build_dir,
                &self.config.build_artifacts_cache,
                &deps_dir,
            )
            .await?;

        let release = release::read_release(
            invoker.as_ref(),
            plan.final_buildpack(),
            &self.config.build_dir,
        )
        .await?;
        let procfile = procfile::read_procfile(&self.config.build_dir).await?;

        let process_types = metadata::reconcile_process_types(&release, procfile);
        let start_command = metadata::start_command(&process_types, &self.event_sender);

        let buildpacks = metadata::buildpack_metadata(&plan).await;
        let lifecycle = metadata::lifecycle_metadata(&plan, buildpacks);
        let staging_result = StagingResult::new(process_types, lifecycle);

        let result_json = serde_json::to_vec(&staging_result)?;
        fs::write(&self.config.output_metadata, result_json)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.config.output_metadata))?;

        let staging_info = StagingInfo {
            detected_buildpack: plan.detected_name().to_string(),
            start_command,
        };
        let tree = StagingTree::new(contents_dir);
        let deps = outcome.supplied.then_some(deps_dir.as_path());
        tree.build(&self.config.build_dir, deps, &staging_info)
            .await?;

        archive::create_tgz_archive(tree.root(), &self.config.output_droplet).await?;
        archive::create_tgz_archive(
            &self.config.build_artifacts_cache,
            &self.config.output_build_artifacts_cache,
        )
        .await?;

        self.emit(Event::StagingCompleted {
            droplet: self.config.output_droplet.clone(),
        });
        Ok(staging_result)
    }
}
