//! Packaging the install tree into the release archive

use super::plan::{BuildLayout, Operation, Stage, Step};
use super::target::BuildTarget;
use crate::core::error::{DistError, DistResult, ResultExt};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A written archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
  pub path: PathBuf,
  pub size_bytes: u64,
  pub sha256: String,
}

pub fn package_steps(target: &BuildTarget, layout: &BuildLayout) -> Vec<Step> {
  vec![
    Step::new(
      Stage::Package,
      "Create output directory",
      Operation::CreateDir {
        path: layout.output_dir.clone(),
      },
    ),
    Step::new(
      Stage::Package,
      format!("Archive install tree as {}", target.archive_file_name()),
      Operation::Package {
        install_dir: layout.install_dir(),
        archive: layout.archive_path(target),
        root_name: target.archive_stem(),
      },
    ),
  ]
}

/// Write `install_dir` as a .tar.gz whose single top-level entry is `root_name/`
///
/// Symlinks (versioned shared library names) are stored as links.
pub fn create_archive(install_dir: &Path, archive: &Path, root_name: &str) -> DistResult<ArchiveReport> {
  if !install_dir.is_dir() {
    return Err(DistError::message(format!(
      "Install directory does not exist: {}",
      install_dir.display()
    )));
  }

  let file = File::create(archive).with_context(|| format!("Failed to create {}", archive.display()))?;
  let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
  let mut builder = tar::Builder::new(encoder);
  builder.follow_symlinks(false);
  builder
    .append_dir_all(root_name, install_dir)
    .with_context(|| format!("Failed to archive {}", install_dir.display()))?;
  builder.into_inner()?.finish()?.flush()?;

  let size_bytes = fs::metadata(archive)?.len();
  let sha256 = sha256_file(archive)?;
  tracing::debug!(archive = %archive.display(), size_bytes, %sha256, "archive written");

  Ok(ArchiveReport {
    path: archive.to_path_buf(),
    size_bytes,
    sha256,
  })
}

/// Hex SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> DistResult<String> {
  let mut reader = BufReader::new(File::open(path)?);
  let mut hasher = Sha256::new();
  io::copy(&mut reader, &mut hasher)?;
  Ok(format!("{:x}", hasher.finalize()))
}
