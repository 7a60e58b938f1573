//! Fetching and unpacking the ICU4C source release

use super::plan::{BuildLayout, Operation, Stage, Step};
use super::target::BuildTarget;
use crate::core::error::{DistError, DistResult, ResultExt};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Whole-transfer limit for the source tarball
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Steps that leave the source tree at `<work>/icu/source`
pub fn fetch_steps(target: &BuildTarget, layout: &BuildLayout, url: &str) -> Vec<Step> {
  let archive = layout.source_archive(&target.version);
  vec![
    Step::new(
      Stage::Fetch,
      "Create work directory",
      Operation::CreateDir {
        path: layout.work_dir.clone(),
      },
    ),
    Step::new(
      Stage::Fetch,
      format!("Download ICU4C {} sources", target.version),
      Operation::Download {
        url: url.to_string(),
        dest: archive.clone(),
      },
    ),
    Step::new(
      Stage::Fetch,
      "Extract sources",
      Operation::Extract {
        archive,
        dest: layout.work_dir.clone(),
      },
    ),
  ]
}

/// Download `url` to `dest`, returning the number of bytes written
pub fn download(url: &str, dest: &Path) -> DistResult<u64> {
  tracing::info!(%url, dest = %dest.display(), "downloading");

  let client = reqwest::blocking::Client::builder()
    .user_agent(concat!("icu4c-dist/", env!("CARGO_PKG_VERSION")))
    .timeout(DOWNLOAD_TIMEOUT)
    .build()?;

  let mut response = client
    .get(url)
    .send()
    .and_then(|r| r.error_for_status())
    .map_err(|e| DistError::with_help(format!("Failed to download {}: {}", url, e), "Check icu.version and icu.source_url."))?;

  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut file = File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
  let bytes = response.copy_to(&mut file)?;

  tracing::debug!(bytes, "download complete");
  Ok(bytes)
}

/// Unpack a gzipped tarball into `dest`
pub fn extract_tgz(archive: &Path, dest: &Path) -> DistResult<()> {
  let file = File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
  fs::create_dir_all(dest)?;

  let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
  tarball
    .unpack(dest)
    .with_context(|| format!("Failed to extract {} into {}", archive.display(), dest.display()))?;
  Ok(())
}
