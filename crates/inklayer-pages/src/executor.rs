//! Background execution seam for page rendering.
//!
//! Render jobs must never block gesture handling, so the cache manager
//! hands them to an executor and collects results over a channel on the
//! coordination context.

/// Runs render jobs off the coordination context.
pub trait RenderExecutor {
    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

/// Executor backed by short-lived worker threads.
pub struct ThreadExecutor;

impl RenderExecutor for ThreadExecutor {
    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        if let Err(err) = std::thread::Builder::new()
            .name("inklayer-render".to_string())
            .spawn(job)
        {
            log::error!("failed to spawn render worker: {err}");
        }
    }
}

/// Executor that runs jobs immediately on the calling thread.
///
/// Deterministic; intended for tests and hosts that schedule their own
/// background work.
pub struct InlineExecutor;

impl RenderExecutor for InlineExecutor {
    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        job();
    }
}
