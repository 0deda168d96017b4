//! One-shot cancellation handles.
//!
//! The registry keeps the [`CancelHandle`] and the watcher task awaits the
//! matching [`Cancelled`] future. Firing consumes the handle, so a handle
//! can never be signalled twice.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Create a connected handle / signal pair.
pub fn cancellation() -> (CancelHandle, Cancelled) {
    let (tx, rx) = oneshot::channel();
    (CancelHandle { tx }, Cancelled { rx })
}

/// Sending half, owned by the registry entry.
#[derive(Debug)]
pub struct CancelHandle {
    tx: oneshot::Sender<()>,
}

impl CancelHandle {
    /// Fire the signal. Returns `false` when the watcher is already gone.
    pub fn cancel(self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Resolves once the paired handle fires or is dropped.
#[derive(Debug)]
pub struct Cancelled {
    rx: oneshot::Receiver<()>,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}
