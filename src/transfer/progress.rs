//! Transfer progress accounting
//!
//! Counters only ever increase, so any observer polling a snapshot sees
//! monotonically non-decreasing progress suitable for a progress indicator.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

/// Shared progress for one upload batch
#[derive(Clone)]
pub struct TransferProgress {
    inner: Arc<ProgressInner>,
}

struct ProgressInner {
    bytes_total: u64,
    items_total: usize,
    bytes_sent: AtomicU64,
    items_done: AtomicUsize,
}

impl TransferProgress {
    pub fn new(bytes_total: u64, items_total: usize) -> Self {
        Self {
            inner: Arc::new(ProgressInner {
                bytes_total,
                items_total,
                bytes_sent: AtomicU64::new(0),
                items_done: AtomicUsize::new(0),
            }),
        }
    }

    pub(crate) fn add_bytes(&self, n: u64) {
        self.inner.bytes_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn item_done(&self) {
        self.inner.items_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of the counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_total: self.inner.bytes_total,
            bytes_sent: self.inner.bytes_sent.load(Ordering::Relaxed),
            items_total: self.inner.items_total,
            items_done: self.inner.items_done.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time progress reading
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub bytes_total: u64,
    pub bytes_sent: u64,
    pub items_total: usize,
    pub items_done: usize,
}

impl ProgressSnapshot {
    /// Percentage of bytes sent, 100 for an empty batch
    pub fn percent(&self) -> f64 {
        if self.bytes_total == 0 {
            return 100.0;
        }
        (self.bytes_sent as f64 / self.bytes_total as f64) * 100.0
    }
}

/// Stream adapter that counts bytes as they are read off the wire side
pub(crate) struct CountingStream<S> {
    inner: S,
    progress: TransferProgress,
}

impl<S> CountingStream<S> {
    pub(crate) fn new(inner: S, progress: TransferProgress) -> Self {
        Self { inner, progress }
    }
}

impl<S> Stream for CountingStream<S>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.progress.add_bytes(chunk.len() as u64);
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}
