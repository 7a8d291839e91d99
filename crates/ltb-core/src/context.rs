//! Per-event call context: a cancellation token plus a per-call timeout.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{errors::Error, Result};

#[derive(Clone, Debug)]
pub struct CallContext {
    pub cancel: CancellationToken,
    pub timeout: Duration,
}

impl CallContext {
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    /// Run a network call under this context.
    ///
    /// Cancellation wins over completion; an elapsed timeout yields `Error::Timeout`.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            res = tokio::time::timeout(self.timeout, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(Error::Timeout(self.timeout)),
            },
        }
    }
}
