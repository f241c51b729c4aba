//! Completion semantics shared by every ingestion entry point.
//!
//! Each operation settles exactly once, with either a container or a typed error. If a
//! [`Callback`] was supplied it runs first, with the same result, in the same completion turn as
//! the future's resolution.

use std::fmt;
use std::future::{Future, IntoFuture};

use futures::future::{BoxFuture, FutureExt};

use crate::error::IngestionResult;
use crate::types::DataContainer;

/// Future returned by ingestion entry points.
pub type Completion = BoxFuture<'static, IngestionResult<DataContainer>>;

/// One-shot completion callback. It sees failures as well as successes.
pub struct Callback(Box<dyn FnOnce(&IngestionResult<DataContainer>) + Send + 'static>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&IngestionResult<DataContainer>) + Send + 'static,
    {
        Self(Box::new(f))
    }

    fn invoke(self, result: &IngestionResult<DataContainer>) {
        (self.0)(result)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// Drive `work` to completion, then hand its result to `callback` (if any) and to the future.
pub fn deliver<W>(work: W, callback: Option<Callback>) -> Completion
where
    W: Future<Output = IngestionResult<DataContainer>> + Send + 'static,
{
    async move {
        let result = work.await;
        if let Some(cb) = callback {
            cb.invoke(&result);
        }
        result
    }
    .boxed()
}

/// A container handed out before its content is available.
///
/// [`Deferred::target`] can be held and read at any time, but its payload is only meaningful once
/// the deferred operation has been awaited. Awaiting populates that same container in place and
/// resolves with it.
pub struct Deferred {
    target: DataContainer,
    completion: Completion,
}

impl Deferred {
    pub(crate) fn new(target: DataContainer, completion: Completion) -> Self {
        Self { target, completion }
    }

    /// The container that will be populated on completion.
    pub fn target(&self) -> &DataContainer {
        &self.target
    }
}

impl IntoFuture for Deferred {
    type Output = IngestionResult<DataContainer>;
    type IntoFuture = Completion;

    fn into_future(self) -> Self::IntoFuture {
        self.completion
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").field("target", &self.target).finish()
    }
}
