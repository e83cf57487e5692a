//! Progress reporting and cooperative cancellation for long-running engines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::types::{DggsError, Result};

/// Receives progress fractions in `[0, 1]`.
pub trait ProgressSink {
  fn set_progress(&self, fraction: f64);
}

/// Sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
  fn set_progress(&self, _fraction: f64) {}
}

impl<F: Fn(f64)> ProgressSink for F {
  fn set_progress(&self, fraction: f64) {
    self(fraction);
  }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
  flag: Arc<AtomicBool>,
}

impl CancellationToken {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  #[must_use]
  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }

  /// `Err(Cancelled)` once the flag is set.
  pub fn check(&self) -> Result<()> {
    if self.is_cancelled() {
      Err(DggsError::Cancelled)
    } else {
      Ok(())
    }
  }
}

/// Forwards progress to a sink, never letting it decrease or leave `[0, 1]`.
pub struct ProgressTracker<'a> {
  sink: &'a dyn ProgressSink,
  last: f64,
}

impl<'a> ProgressTracker<'a> {
  pub fn new(sink: &'a dyn ProgressSink) -> Self {
    Self { sink, last: 0.0 }
  }

  pub fn report(&mut self, fraction: f64) {
    if !fraction.is_finite() {
      return;
    }
    let clamped = fraction.clamp(0.0, 1.0);
    if clamped > self.last {
      self.last = clamped;
      self.sink.set_progress(clamped);
    }
  }

  /// Reports `done / total`; a zero total counts as finished.
  pub fn report_ratio(&mut self, done: usize, total: usize) {
    if total == 0 {
      self.report(1.0);
    } else {
      self.report(done as f64 / total as f64);
    }
  }

  pub fn finish(&mut self) {
    self.report(1.0);
  }

  #[must_use]
  pub fn last(&self) -> f64 {
    self.last
  }
}

/// Maps the `[0, 1]` progress of one stage onto `[start, start + span]` of
/// an enclosing sink.
pub struct StageProgress<'a> {
  sink: &'a dyn ProgressSink,
  start: f64,
  span: f64,
}

impl<'a> StageProgress<'a> {
  pub fn new(sink: &'a dyn ProgressSink, start: f64, span: f64) -> Self {
    Self { sink, start, span }
  }
}

impl ProgressSink for StageProgress<'_> {
  fn set_progress(&self, fraction: f64) {
    self.sink.set_progress(self.start + self.span * fraction.clamp(0.0, 1.0));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;

  #[test]
  fn test_tracker_is_monotonic() {
    let seen = RefCell::new(Vec::new());
    let sink = |p: f64| seen.borrow_mut().push(p);
    let mut tracker = ProgressTracker::new(&sink);
    tracker.report(0.2);
    tracker.report(0.1);
    tracker.report(1.5);
    tracker.report(f64::NAN);
    assert_eq!(*seen.borrow(), vec![0.2, 1.0]);
    assert!((tracker.last() - 1.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_stage_progress_scales() {
    let seen = RefCell::new(Vec::new());
    let sink = |p: f64| seen.borrow_mut().push(p);
    let stage = StageProgress::new(&sink, 0.5, 0.5);
    stage.set_progress(0.0);
    stage.set_progress(0.5);
    stage.set_progress(2.0);
    assert_eq!(*seen.borrow(), vec![0.5, 0.75, 1.0]);
  }

  #[test]
  fn test_cancellation_shared_between_clones() {
    let token = CancellationToken::new();
    let other = token.clone();
    assert!(token.check().is_ok());
    other.cancel();
    assert_eq!(token.check(), Err(DggsError::Cancelled));
  }
}
