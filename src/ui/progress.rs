//! Progress bars for parallel artifact downloads
//!
//! `linya` bars drawn to stderr, shared between rayon workers behind a mutex.

use linya::{Bar, Progress};
use std::sync::{Arc, Mutex};

/// Thread-safe set of progress bars
#[derive(Clone)]
pub struct MultiProgress {
  progress: Arc<Mutex<Progress>>,
}

impl MultiProgress {
  pub fn new() -> Self {
    Self {
      progress: Arc::new(Mutex::new(Progress::new())),
    }
  }

  /// Add a new bar with a label and total
  ///
  /// Returns `None` if another worker panicked while drawing.
  pub fn add_bar(&self, total: usize, label: impl Into<String>) -> Option<Bar> {
    let mut progress = self.progress.lock().ok()?;
    Some(progress.bar(total, label.into()))
  }

  /// Advance a bar by one
  pub fn inc(&self, bar: &Bar) {
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(bar, 1);
    }
  }
}

impl Default for MultiProgress {
  fn default() -> Self {
    Self::new()
  }
}
