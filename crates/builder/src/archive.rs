//! Gzipped tar creation for droplets and build caches
//!
//! Entries are rooted at `./` with explicit directory entries, children
//! sorted lexicographically, and normalized ownership and timestamps so
//! identical trees produce identical archives.

use flate2::write::GzEncoder;
use flate2::Compression;
use stager_errors::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Package the contents of `source_dir` into a gzipped tar at
/// `archive_path`, entry names rooted at `./`.
///
/// # Errors
///
/// Returns an error if file I/O fails or tar creation fails.
pub(crate) async fn create_tgz_archive(source_dir: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path)
        .await
        .map_err(|e| Error::io_with_path(&e, archive_path))?;
    let file = file.into_std().await;
    let source_dir = source_dir.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut tar_builder = tar::Builder::new(encoder);
        tar_builder.follow_symlinks(false);

        add_directory_to_tar(&mut tar_builder, &source_dir, Path::new(""))?;

        let encoder = tar_builder
            .into_inner()
            .map_err(|e| Error::internal(format!("tar finish failed: {e}")))?;
        encoder
            .finish()
            .map_err(|e| Error::internal(format!("gzip finish failed: {e}")))?;
        Ok(())
    })
    .await
    .map_err(|e| Error::internal(format!("archive task failed: {e}")))??;

    Ok(())
}

/// Recursively add directory contents with deterministic ordering
fn add_directory_to_tar<W: std::io::Write>(
    tar_builder: &mut tar::Builder<W>,
    dir_path: &Path,
    tar_path: &Path,
) -> Result<()> {
    let mut entries = std::fs::read_dir(dir_path)?.collect::<std::io::Result<Vec<_>>>()?;

    // Locale-independent ordering keeps archives reproducible across
    // filesystems.
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for entry in entries {
        let file_path = entry.path();
        let file_name = entry.file_name();

        let tar_entry_path = if tar_path.as_os_str().is_empty() {
            PathBuf::from(&file_name)
        } else {
            tar_path.join(&file_name)
        };

        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(normalize_file_permissions(&metadata));
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            header.set_cksum();

            let tar_dir_path = format!("./{}/", tar_entry_path.display());
            tar_builder.append_data(&mut header, &tar_dir_path, std::io::empty())?;

            add_directory_to_tar(tar_builder, &file_path, &tar_entry_path)?;
        } else if metadata.is_file() {
            let mut file = std::fs::File::open(&file_path)?;
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(metadata.len());
            header.set_mode(normalize_file_permissions(&metadata));
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            header.set_cksum();

            tar_builder.append_data(
                &mut header,
                format!("./{}", tar_entry_path.display()),
                &mut file,
            )?;
        } else if metadata.is_symlink() {
            let target = std::fs::read_link(&file_path)?;
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_size(0);
            header.set_mode(0o777);
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            header
                .set_link_name(&target)
                .map_err(|e| Error::io_with_path(&e, &file_path))?;
            header.set_cksum();

            tar_builder.append_data(
                &mut header,
                format!("./{}", tar_entry_path.display()),
                std::io::empty(),
            )?;
        }
        // Other special files (device nodes, fifos) are skipped.
    }

    Ok(())
}

/// Normalize permissions so umask and filesystem differences do not leak
/// into the archive. Execute bits survive; everything else collapses to
/// the standard modes.
fn normalize_file_permissions(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    let current_mode = metadata.permissions().mode();

    if metadata.is_dir() {
        0o755
    } else if current_mode & 0o111 != 0 {
        0o755
    } else {
        0o644
    }
}
