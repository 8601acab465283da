//! Shared test support: sandboxed staging runs and fixture buildpacks
//!
//! Fixture buildpacks are fabricated per test as small shell scripts,
//! mirroring the classic fixture set (always-detects, has-finalize,
//! fails-to-supply, ...) the staging contract grew up with.

#![allow(dead_code)]

use stager_builder::{buildpack_dir_name, Config, Runner};
use stager_events::Event;
use stager_types::StagingResult;
use std::fs;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

pub const RELEASE_WEB: &str =
    "cat <<EOF\n---\ndefault_process_types:\n  web: the start command\nEOF";

pub const RELEASE_NON_WEB: &str =
    "cat <<EOF\n---\ndefault_process_types:\n  nonweb: start nonweb buildpack\nEOF";

pub const RELEASE_EMPTY: &str = "echo '--- {}'";

pub struct StagingSandbox {
    pub tmp: TempDir,
    pub build_dir: PathBuf,
    pub buildpacks_dir: PathBuf,
    pub output_droplet: PathBuf,
    pub output_metadata: PathBuf,
    pub output_cache: PathBuf,
    pub cache_dir: PathBuf,
}

impl StagingSandbox {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let build_dir = tmp.path().join("app");
        let buildpacks_dir = tmp.path().join("buildpacks");
        fs::create_dir_all(&build_dir).unwrap();
        fs::create_dir_all(&buildpacks_dir).unwrap();

        Self {
            build_dir,
            buildpacks_dir,
            output_droplet: tmp.path().join("droplet.tgz"),
            output_metadata: tmp.path().join("result.json"),
            output_cache: tmp.path().join("cache.tgz"),
            cache_dir: tmp.path().join("cache"),
            tmp,
        }
    }

    pub fn config(&self, order: &[&str], skip_detect: bool) -> Config {
        Config {
            build_dir: self.build_dir.clone(),
            buildpacks_dir: self.buildpacks_dir.clone(),
            output_droplet: self.output_droplet.clone(),
            output_build_artifacts_cache: self.output_cache.clone(),
            output_metadata: self.output_metadata.clone(),
            buildpack_order: order.iter().map(|key| (*key).to_string()).collect(),
            build_artifacts_cache: self.cache_dir.clone(),
            skip_detect,
        }
    }

    /// Run the staging pipeline, returning its result and every event it
    /// emitted.
    pub async fn run(
        &self,
        order: &[&str],
        skip_detect: bool,
    ) -> (stager_errors::Result<StagingResult>, Vec<Event>) {
        let (tx, mut rx) = stager_events::channel();
        let mut runner = Runner::new(self.config(order, skip_detect)).with_event_sender(tx);
        let result = runner.run().await;
        drop(runner);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (result, events)
    }

    pub fn write_app_file(&self, name: &str, contents: &str) {
        fs::write(self.build_dir.join(name), contents).unwrap();
    }

    pub fn write_procfile(&self, contents: &str) {
        self.write_app_file("Procfile", contents);
    }

    /// Create a fixture buildpack under its hashed directory name.
    pub fn buildpack(&self, key: &str) -> FixtureBuildpack {
        FixtureBuildpack::new(self.buildpacks_dir.join(buildpack_dir_name(key)))
    }

    pub fn result_metadata(&self) -> StagingResult {
        serde_json::from_slice(&fs::read(&self.output_metadata).unwrap()).unwrap()
    }

    pub fn result_metadata_json(&self) -> serde_json::Value {
        serde_json::from_slice(&fs::read(&self.output_metadata).unwrap()).unwrap()
    }

    /// Entry names of the droplet archive, `./`-rooted as stored.
    pub fn droplet_entries(&self) -> Vec<String> {
        archive_entries(&self.output_droplet)
    }

    /// Contents of one file entry of the droplet archive.
    pub fn droplet_file(&self, name: &str) -> Option<String> {
        archive_file(&self.output_droplet, name)
    }

    pub fn cache_entries(&self) -> Vec<String> {
        archive_entries(&self.output_cache)
    }

    pub fn staging_info(&self) -> serde_json::Value {
        let raw = self.droplet_file("./staging_info.yml").unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

pub struct FixtureBuildpack {
    pub dir: PathBuf,
}

impl FixtureBuildpack {
    pub fn new(dir: PathBuf) -> Self {
        fs::create_dir_all(dir.join("bin")).unwrap();
        Self { dir }
    }

    /// Add an executable `bin/<name>` shell script.
    pub fn script(self, name: &str, body: &str) -> Self {
        let path = self.dir.join("bin").join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        self
    }

    pub fn manifest(self, yaml: &str) -> Self {
        fs::write(self.dir.join("manifest.yml"), yaml).unwrap();
        self
    }

    pub fn make_script_non_executable(&self, name: &str) {
        let path = self.dir.join("bin").join(name);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    pub fn remove_script(&self, name: &str) {
        fs::remove_file(self.dir.join("bin").join(name)).unwrap();
    }
}

fn archive_entries(path: &std::path::Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    archive
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap().path().unwrap().display().to_string())
        .collect()
}

fn archive_file(path: &std::path::Path, name: &str) -> Option<String> {
    let file = fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.path().unwrap().display().to_string() == name {
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            return Some(contents);
        }
    }
    None
}

/// Whether any diagnostic event's message contains `needle`.
pub fn logged(events: &[Event], needle: &str) -> bool {
    logged_count(events, needle) > 0
}

/// How many diagnostic events mention `needle`.
pub fn logged_count(events: &[Event], needle: &str) -> usize {
    events
        .iter()
        .filter(|event| event.message().is_some_and(|message| message.contains(needle)))
        .count()
}

// The classic fixture set.

pub fn install_always_detects(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("always-detects")
        .script("detect", "echo 'Always Matching'")
        .script("supply", "echo 'always-detects-buildpack' > \"$3/$4/supplied\"")
        .script("compile", "echo 'always-detects-buildpack' > \"$1/compiled\"")
        .script("release", RELEASE_WEB);
}

pub fn install_also_always_detects(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("also-always-detects")
        .script("detect", "echo 'Also Always Matching'")
        .script(
            "compile",
            "echo 'also-always-detects-buildpack' > \"$1/compiled\"",
        )
        .script("release", RELEASE_WEB);
}

pub fn install_creates_build_artifacts(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("always-detects-creates-build-artifacts")
        .script("detect", "echo 'Creates Buildpack Artifacts'")
        .script(
            "supply",
            "echo 'always-detects-creates-buildpack-artifacts' > \"$3/$4/supplied\"\necho 'cached' > \"$2/artifact\"",
        )
        .manifest("name: Creates Buildpack Artifacts\nversion: 9.1.3\n");
}

pub fn install_has_finalize(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("has-finalize")
        .script("detect", "echo 'Finalize'")
        .script("supply", "echo 'has-finalize-buildpack' > \"$3/$4/supplied\"")
        .script(
            "finalize",
            "echo 'has-finalize-buildpack' > \"$1/finalized\"\nmkdir -p \"$1/.profile.d\"\ntouch \"$1/.profile.d/finalized.sh\"",
        )
        .script("release", RELEASE_WEB)
        .manifest("name: Finalize\n");
}

pub fn install_has_finalize_no_supply(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("has-finalize-no-supply")
        .script(
            "finalize",
            "echo 'has-finalize-no-supply-buildpack' > \"$1/finalized\"",
        )
        .script("release", RELEASE_WEB);
}

pub fn install_always_fails_detect(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("always-fails-detect")
        .script("detect", "exit 1")
        .script("compile", "echo 'compiled' > \"$1/compiled\"")
        .script("release", RELEASE_WEB);
}

pub fn install_fails_to_compile(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("fails-to-compile")
        .script("detect", "echo 'Fails To Compile'")
        .script("compile", "exit 1")
        .script("release", RELEASE_WEB);
}

pub fn install_fails_to_supply(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("fails-to-supply")
        .script("supply", "exit 1");
}

pub fn install_always_detects_non_web(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("always-detects-non-web")
        .script("detect", "echo 'Always Detects Non-Web'")
        .script("compile", "echo 'compiled' > \"$1/compiled\"")
        .script("release", RELEASE_NON_WEB);
}

pub fn install_release_without_command(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("release-without-command")
        .script("detect", "echo 'Release Without Command'")
        .script("compile", "echo 'compiled' > \"$1/compiled\"")
        .script("release", RELEASE_EMPTY);
}

pub fn install_release_generates_bad_yaml(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("release-generates-bad-yaml")
        .script("detect", "echo 'Bad Yaml'")
        .script("compile", "echo 'compiled' > \"$1/compiled\"")
        .script("release", "echo '{ this is not: [valid'");
}

pub fn install_fails_to_release(sandbox: &StagingSandbox) {
    sandbox
        .buildpack("fails-to-release")
        .script("detect", "echo 'Fails To Release'")
        .script("compile", "echo 'compiled' > \"$1/compiled\"")
        .script("release", "exit 1");
}
