//! Wait for image and artifact references to replicate

use crate::core::error::{ReplicationError, ResourceResult};
use crate::pivnet::ReplicationStatus;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Time source for the replication wait
pub trait Clock {
  fn now(&self) -> Instant;
  fn sleep(&self, duration: Duration);
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }

  fn sleep(&self, duration: Duration) {
    std::thread::sleep(duration);
  }
}

/// Polls one reference at a time until it settles or the deadline passes
pub struct ReplicationPoller<'a> {
  clock: &'a dyn Clock,
  poll_frequency: Duration,
  timeout: Duration,
}

impl<'a> ReplicationPoller<'a> {
  pub fn new(clock: &'a dyn Clock, poll_frequency: Duration, timeout: Duration) -> Self {
    Self {
      clock,
      poll_frequency,
      timeout,
    }
  }

  /// Block until `status` reports complete
  ///
  /// The deadline applies per reference. A timeout too large to represent
  /// never expires. Errors from `status` end the wait.
  pub fn wait<F>(&self, kind: &str, name: &str, mut status: F) -> ResourceResult<()>
  where
    F: FnMut() -> ResourceResult<ReplicationStatus>,
  {
    let deadline = self.clock.now().checked_add(self.timeout);
    loop {
      match status()? {
        ReplicationStatus::Complete => {
          info!(kind, name, "reference replicated");
          return Ok(());
        }
        ReplicationStatus::FailedToReplicate => {
          return Err(
            ReplicationError::Failed {
              kind: kind.to_string(),
              name: name.to_string(),
            }
            .into(),
          );
        }
        other => debug!(kind, name, status = ?other, "reference still replicating"),
      }

      if deadline.is_some_and(|d| self.clock.now() >= d) {
        return Err(
          ReplicationError::TimedOut {
            kind: kind.to_string(),
            name: name.to_string(),
          }
          .into(),
        );
      }
      self.clock.sleep(self.poll_frequency);
    }
  }
}
