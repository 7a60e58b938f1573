//! Downloading and unpacking workflow artifacts

use super::github::GhClient;
use crate::core::error::{DistResult, ResultExt};
use crate::ui::progress::MultiProgress;
use rayon::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Download every artifact into `<dest>/<name>` using a bounded worker pool
///
/// All downloads are attempted; the first error (in artifact order) is returned.
pub fn download_all(gh: GhClient<'_>, run_id: u64, names: &[String], dest: &Path, workers: usize) -> DistResult<()> {
  let pool = rayon::ThreadPoolBuilder::new().num_threads(workers.max(1)).build()?;

  let multi_progress = MultiProgress::new();
  let bars: Vec<_> = names
    .iter()
    .map(|name| multi_progress.add_bar(1, format!("Downloading {}", name)))
    .collect();

  let results: Vec<DistResult<()>> = pool.install(|| {
    names
      .par_iter()
      .enumerate()
      .map(|(idx, name)| {
        let result = gh
          .download_artifact(run_id, name, &dest.join(name))
          .with_context(|| format!("Failed to download artifact {}", name));
        if let Some(bar) = &bars[idx] {
          multi_progress.inc(bar);
        }
        tracing::debug!(artifact = %name, ok = result.is_ok(), "download finished");
        result
      })
      .collect()
  });

  for result in results {
    result?;
  }
  Ok(())
}

/// Unpack every `*.zip` directly inside `dir` into `dir`
pub fn extract_zips(dir: &Path) -> DistResult<usize> {
  let mut extracted = 0;
  for path in files_with_suffix(dir, ".zip")? {
    eprintln!("   Extracting {}...", file_name(&path));
    let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;
    archive.extract(dir)?;
    extracted += 1;
  }
  Ok(extracted)
}

/// Extract zips in each artifact directory, then gather the `*.tar.gz` files
///
/// The result is sorted by file name.
pub fn collect_archives(download_dir: &Path) -> DistResult<Vec<PathBuf>> {
  let mut archives = Vec::new();

  for entry in fs::read_dir(download_dir).with_context(|| format!("Failed to read {}", download_dir.display()))? {
    let dir = entry?.path();
    if !dir.is_dir() {
      continue;
    }
    extract_zips(&dir)?;
    archives.extend(files_with_suffix(&dir, ".tar.gz")?);
  }

  archives.sort_by(|a, b| file_name(a).cmp(&file_name(b)));
  Ok(archives)
}

fn files_with_suffix(dir: &Path, suffix: &str) -> DistResult<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_file() && file_name(&path).ends_with(suffix) {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

pub fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default()
}
