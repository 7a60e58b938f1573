//! Utility functions for cross-platform path handling and file copies

use crate::core::error::{DistError, DistResult, ResultExt};
use std::path::Path;

/// Convert a path to forward-slash form
///
/// CMake project files and container mount targets expect forward slashes,
/// even on Windows.
pub fn path_to_forward_slashes(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Recursively copy a directory, merging into an existing target
pub fn copy_dir_recursive(source: &Path, target: &Path) -> DistResult<u64> {
  if !source.is_dir() {
    return Err(DistError::message(format!(
      "Source directory does not exist: {}",
      source.display()
    )));
  }

  std::fs::create_dir_all(target).with_context(|| format!("Failed to create {}", target.display()))?;

  let mut copied = 0;
  for entry in std::fs::read_dir(source)? {
    let entry = entry?;
    let file_type = entry.file_type()?;
    let source_path = entry.path();
    let target_path = target.join(entry.file_name());

    if file_type.is_dir() {
      copied += copy_dir_recursive(&source_path, &target_path)?;
    } else {
      std::fs::copy(&source_path, &target_path)
        .with_context(|| format!("Failed to copy {} to {}", source_path.display(), target_path.display()))?;
      copied += 1;
    }
  }

  Ok(copied)
}

/// Human-readable size in megabytes with one decimal
pub fn format_megabytes(bytes: u64) -> String {
  format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}
