/*!
UI-Thread Marshaler (`spec.md` §4.D): posts handler work onto the
application's single UI scheduler with a bounded deadline, without ever
blocking the transport reader thread on that scheduler.

The deadlock mode the spec calls out by name — a text-stream reader on a
bidirectional pipe serialized through the UI scheduler — is avoided here by
construction: [`UiThreadMarshaler::run`] hands work to a [`UiScheduler`] and
awaits the result on a channel with a timeout; the awaiting task is never
itself the thread the scheduler runs work on.
*/

use std::time::Duration;

use inspect_core::ErrorKind;

/// A job posted to the UI scheduler: a one-shot closure run at normal
/// priority on whatever thread the scheduler considers "the UI thread".
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Abstracts "the application's single UI scheduler" so a real host can
/// plug in its actual event-loop proxy instead of the standalone
/// [`ThreadScheduler`] this crate ships as a default.
pub trait UiScheduler: Send + Sync + 'static {
  /// Post `job` to run on the UI thread. Must not run `job` inline on the
  /// caller's thread — that would defeat the reader/scheduler isolation
  /// this component exists to provide.
  fn post(&self, job: Job);
}

/// Default [`UiScheduler`]: a single dedicated worker thread that drains a
/// job queue, standing in for a real windowing event loop. Suitable for
/// driving the endpoint standalone (demos, tests) and as a model for how a
/// real adapter's scheduler should behave.
///
/// Grounded on the cross-thread job-posting shape of an `EventLoopProxy`
/// paired with an `mpsc::Sender`: posting from any thread, draining on one.
pub struct ThreadScheduler {
  tx: std::sync::mpsc::Sender<Job>,
  worker: Option<std::thread::JoinHandle<()>>,
}

impl ThreadScheduler {
  /// Spawn the worker thread.
  #[must_use]
  pub fn new() -> Self {
    let (tx, rx) = std::sync::mpsc::channel::<Job>();
    let worker = std::thread::Builder::new()
      .name("ui-thread-marshaler".into())
      .spawn(move || {
        while let Ok(job) = rx.recv() {
          job();
        }
      })
      .expect("failed to spawn UI scheduler worker thread");
    Self { tx, worker: Some(worker) }
  }
}

impl std::fmt::Debug for ThreadScheduler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ThreadScheduler").finish_non_exhaustive()
  }
}

impl Default for ThreadScheduler {
  fn default() -> Self {
    Self::new()
  }
}

impl UiScheduler for ThreadScheduler {
  fn post(&self, job: Job) {
    if self.tx.send(job).is_err() {
      log::warn!(target: "inspect_endpoint::marshal", "ui scheduler worker is gone; dropping posted work");
    }
  }
}

impl Drop for ThreadScheduler {
  fn drop(&mut self) {
    // Dropping `tx` unblocks the worker's `recv`; join so the thread never
    // outlives the endpoint that owns it.
    if let Some(worker) = self.worker.take() {
      let _ = worker.join();
    }
  }
}

/// Marshals handler work onto a [`UiScheduler`] with a deadline, reporting
/// [`ErrorKind::Timeout`] rather than hanging when the deadline passes.
pub struct UiThreadMarshaler<S> {
  scheduler: S,
  default_timeout: Duration,
}

impl<S> UiThreadMarshaler<S>
where
  S: UiScheduler,
{
  /// `default_timeout` is used by [`Self::run`] when no per-call override is
  /// given; `spec.md` §4.D documents a 10 s default.
  #[must_use]
  pub fn new(scheduler: S, default_timeout: Duration) -> Self {
    Self { scheduler, default_timeout }
  }

  /// The configured default timeout.
  #[must_use]
  pub const fn default_timeout(&self) -> Duration {
    self.default_timeout
  }

  /// Run `work` on the UI scheduler and await its result with a deadline.
  ///
  /// `work` must be a leaf operation from the transport's perspective: it
  /// must not itself call back into this marshaler (`spec.md` §4.D).
  pub async fn run<F, T>(&self, work: F, timeout: Option<Duration>) -> Result<T, ErrorKind>
  where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
  {
    let (tx, rx) = tokio::sync::oneshot::channel();
    self.scheduler.post(Box::new(move || {
      let value = work();
      let _ = tx.send(value);
    }));

    let deadline = timeout.unwrap_or(self.default_timeout);
    match tokio::time::timeout(deadline, rx).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(_)) => {
        Err(ErrorKind::HandlerError("UI scheduler dropped the result without completing".into()))
      }
      Err(_) => Err(ErrorKind::Timeout),
    }
  }
}

impl<S> std::fmt::Debug for UiThreadMarshaler<S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UiThreadMarshaler")
      .field("default_timeout", &self.default_timeout)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn run_returns_the_computed_value() {
    let marshaler = UiThreadMarshaler::new(ThreadScheduler::new(), Duration::from_secs(1));
    let result = marshaler.run(|| 2 + 2, None).await;
    assert_eq!(result.unwrap(), 4);
  }

  #[tokio::test]
  async fn run_times_out_when_work_never_completes() {
    struct StuckScheduler;
    impl UiScheduler for StuckScheduler {
      fn post(&self, _job: Job) {
        // Never runs the job - simulates a wedged UI thread.
      }
    }
    let marshaler = UiThreadMarshaler::new(StuckScheduler, Duration::from_millis(20));
    let result = marshaler.run(|| 1, None).await;
    assert!(matches!(result, Err(ErrorKind::Timeout)));
  }

  #[tokio::test]
  async fn per_call_timeout_overrides_default() {
    let marshaler = UiThreadMarshaler::new(ThreadScheduler::new(), Duration::from_secs(10));
    let result = marshaler.run(|| 7, Some(Duration::from_millis(50))).await;
    assert_eq!(result.unwrap(), 7);
  }
}
