//! Staging metadata reconciliation
//!
//! Merges the three metadata sources (buildpack release defaults, app
//! Procfile, buildpack manifests) into the canonical staging result.

use crate::plan::StagingPlan;
use stager_events::{EventEmitter, EventSender};
use stager_types::{BuildpackMetadata, BuildpackRelease, LifecycleMetadata, ProcessTypes};

/// Overlay the Procfile onto the buildpack's default process types.
///
/// Procfile entries replace same-keyed defaults and add new keys; every
/// key present in either source survives.
pub(crate) fn reconcile_process_types(
    release: &BuildpackRelease,
    procfile: Option<ProcessTypes>,
) -> ProcessTypes {
    let mut process_types = release.default_process_types.clone();
    if let Some(procfile) = procfile {
        for (name, command) in procfile {
            process_types.insert(name, command);
        }
    }
    process_types
}

/// The `web` command the droplet will launch with, or empty.
///
/// A missing `web` entry is not fatal; the platform may still supply a
/// command at runtime, so this only warns.
pub(crate) fn start_command(process_types: &ProcessTypes, events: &Option<EventSender>) -> String {
    match process_types.get("web") {
        Some(command) => command.clone(),
        None => {
            events.emit_warning("No start command specified by buildpack or via Procfile.");
            events.emit_warning("App will not start unless a command is provided at runtime.");
            String::new()
        }
    }
}

/// Assemble the `buildpacks` list from each buildpack's manifest.
///
/// The detected buildpack falls back to its detect-script output when the
/// manifest has no name; everything else falls back to the empty string.
pub(crate) async fn buildpack_metadata(plan: &StagingPlan) -> Vec<BuildpackMetadata> {
    let final_index = plan.final_index();
    let mut entries = Vec::with_capacity(plan.buildpacks().len());
    for (index, buildpack) in plan.buildpacks().iter().enumerate() {
        let manifest = buildpack.manifest().await.unwrap_or_default();
        let name = manifest.name.unwrap_or_else(|| {
            if index == final_index {
                plan.detected_name().to_string()
            } else {
                String::new()
            }
        });
        entries.push(BuildpackMetadata {
            key: buildpack.key.clone(),
            name,
            version: manifest.version,
        });
    }
    entries
}

/// Assemble the lifecycle section of the staging result.
pub(crate) fn lifecycle_metadata(
    plan: &StagingPlan,
    buildpacks: Vec<BuildpackMetadata>,
) -> LifecycleMetadata {
    LifecycleMetadata {
        detected_buildpack: plan.detected_name().to_string(),
        buildpack_key: plan.final_buildpack().key.clone(),
        buildpacks,
    }
}
