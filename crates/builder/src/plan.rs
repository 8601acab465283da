//! The selected buildpack sequence and its compilation mode
//!
//! Detect mode selects a single buildpack; skip-detect keeps the whole
//! candidate list. Everything mode-dependent the later phases need lives
//! here so the drivers stay free of mode branching.

use crate::buildpack::{Buildpack, Script};

#[derive(Debug)]
pub(crate) struct StagingPlan {
    buildpacks: Vec<Buildpack>,
    detected_name: String,
}

impl StagingPlan {
    pub fn new(buildpacks: Vec<Buildpack>, detected_name: String) -> Self {
        Self {
            buildpacks,
            detected_name,
        }
    }

    pub fn buildpacks(&self) -> &[Buildpack] {
        &self.buildpacks
    }

    /// The buildpack that finalizes (or compiles) and releases the app
    pub fn final_buildpack(&self) -> &Buildpack {
        self.buildpacks
            .last()
            .expect("plan contains at least one buildpack")
    }

    pub fn final_index(&self) -> usize {
        self.buildpacks.len() - 1
    }

    /// Human-readable name captured from detect (empty under skip-detect)
    pub fn detected_name(&self) -> &str {
        &self.detected_name
    }

    /// Supply/finalize mode rather than plain single-buildpack compile
    pub fn is_multi(&self) -> bool {
        self.buildpacks.len() > 1 || self.final_buildpack().has_script(Script::Finalize)
    }
}
