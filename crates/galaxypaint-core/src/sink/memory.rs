//! In-memory sink.

use super::{PersistenceSink, SaveOutcome};
use crate::raster::RasterBlob;
use crate::transport::BoxFuture;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Sink that keeps every committed raster in memory.
///
/// Useful for tests and previews. The outcome it reports can be scripted, and
/// it can be told to stay pending for a number of polls to model a slow
/// network.
#[derive(Default)]
pub struct MemorySink {
    commits: RefCell<Vec<(String, RasterBlob)>>,
    outcome: RefCell<Option<SaveOutcome>>,
    pending_polls: Cell<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `outcome` instead of `Success` from now on.
    pub fn respond_with(&self, outcome: SaveOutcome) {
        *self.outcome.borrow_mut() = Some(outcome);
    }

    /// Stay pending for `polls` polls before resolving each commit.
    pub fn set_pending_polls(&self, polls: usize) {
        self.pending_polls.set(polls);
    }

    /// Number of commits received.
    pub fn commit_count(&self) -> usize {
        self.commits.borrow().len()
    }

    /// Names and rasters committed so far, oldest first.
    pub fn commits(&self) -> Vec<(String, RasterBlob)> {
        self.commits.borrow().clone()
    }

    pub fn last_commit(&self) -> Option<(String, RasterBlob)> {
        self.commits.borrow().last().cloned()
    }
}

impl PersistenceSink for MemorySink {
    fn commit(&self, name: &str, raster: RasterBlob) -> BoxFuture<'_, SaveOutcome> {
        let name = name.to_string();
        let polls = self.pending_polls.get();
        Box::pin(async move {
            Pending::new(polls).await;
            self.commits.borrow_mut().push((name, raster));
            self.outcome.borrow().clone().unwrap_or(SaveOutcome::Success)
        })
    }
}

/// Future that returns `Pending` a fixed number of times, waking itself each
/// time, then completes.
struct Pending {
    remaining: usize,
}

impl Pending {
    fn new(polls: usize) -> Self {
        Self { remaining: polls }
    }
}

impl Future for Pending {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
