//! Droplet staging tree construction
//!
//! Assembles the canonical layout inside the runner's private staging
//! root. Layout is separate from archiving so the tree shape is testable
//! without unpacking tarballs.

use stager_errors::{Error, Result};
use stager_types::StagingInfo;
use std::path::{Path, PathBuf};
use tokio::fs;

/// The canonical droplet directory layout:
///
/// ```text
/// ./app/              app sources plus buildpack output
/// ./tmp/              empty
/// ./logs/             empty
/// ./profile.d/        shell snippets, when buildpacks produced any
/// ./deps/<i>/         supplied dependencies, multi-buildpack mode only
/// ./staging_info.yml
/// ```
pub(crate) struct StagingTree {
    root: PathBuf,
}

impl StagingTree {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Populate the tree from the post-compile build directory.
    ///
    /// `deps_dir` is moved in only when the supply phase actually ran.
    ///
    /// # Errors
    ///
    /// Returns an error when any filesystem operation fails.
    pub async fn build(
        &self,
        build_dir: &Path,
        deps_dir: Option<&Path>,
        staging_info: &StagingInfo,
    ) -> Result<()> {
        let app = self.root.join("app");
        copy_directory_recursive(build_dir, &app).await?;

        // Buildpacks drop shell snippets into <build-dir>/.profile.d;
        // they ship at the droplet root, not inside the app.
        let profile_src = app.join(".profile.d");
        if fs::metadata(&profile_src).await.is_ok() {
            move_directory(&profile_src, &self.root.join("profile.d")).await?;
        }

        fs::create_dir_all(self.root.join("tmp")).await?;
        fs::create_dir_all(self.root.join("logs")).await?;

        if let Some(deps_dir) = deps_dir {
            move_directory(deps_dir, &self.root.join("deps")).await?;
        }

        let info = serde_json::to_vec(staging_info)?;
        let info_path = self.root.join("staging_info.yml");
        fs::write(&info_path, info)
            .await
            .map_err(|e| Error::io_with_path(&e, &info_path))?;

        Ok(())
    }
}

/// Recursively copy directory contents
pub(crate) fn copy_directory_recursive<'a>(
    src: &'a Path,
    dst: &'a Path,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        fs::create_dir_all(dst).await?;

        let mut entries = fs::read_dir(src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let entry_path = entry.path();
            let dst_path = dst.join(entry.file_name());

            if entry_path.is_dir() {
                copy_directory_recursive(&entry_path, &dst_path).await?;
            } else {
                fs::copy(&entry_path, &dst_path).await?;
            }
        }

        Ok(())
    })
}

async fn move_directory(src: &Path, dst: &Path) -> Result<()> {
    if fs::rename(src, dst).await.is_ok() {
        return Ok(());
    }
    // Rename fails across filesystems; fall back to copy-and-remove.
    copy_directory_recursive(src, dst).await?;
    fs::remove_dir_all(src)
        .await
        .map_err(|e| Error::io_with_path(&e, src))?;
    Ok(())
}
