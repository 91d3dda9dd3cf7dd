use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use auto_impl::auto_impl;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::Error;

/// Destination of the messages handed off by a [`RealtimePublisher`].
///
/// Runs on the publisher's worker thread, so it may block.
#[auto_impl(Box)]
pub trait ReportSink<M>: Send + 'static {
    fn publish(&mut self, msg: M) -> Result<(), Error>;
}

impl<M> ReportSink<M> for flume::Sender<M>
where
    M: Send + 'static,
{
    fn publish(&mut self, msg: M) -> Result<(), Error> {
        self.send(msg).map_err(|_| Error::Disconnected)
    }
}

/// A [`ReportSink`] backed by a closure.
pub struct FnSink<F>(pub F);

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

impl<M, F> ReportSink<M> for FnSink<F>
where
    F: FnMut(M) -> Result<(), Error> + Send + 'static,
{
    fn publish(&mut self, msg: M) -> Result<(), Error> {
        (self.0)(msg)
    }
}

/// A [`ReportSink`] that logs every message at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl<M> ReportSink<M> for TracingSink
where
    M: fmt::Debug + Send + 'static,
{
    fn publish(&mut self, msg: M) -> Result<(), Error> {
        debug!(?msg, "report");
        Ok(())
    }
}

struct Shared<M> {
    msg: Mutex<M>,
    /// Set by the control side when the buffer holds a message the worker has
    /// not taken yet.
    pending: AtomicBool,
}

/// Single-slot message buffer that a real-time thread fills without blocking
/// and a worker thread forwards to a [`ReportSink`].
///
/// The real-time side calls [`try_lock`](Self::try_lock), fills the message and
/// calls [`PublishGuard::unlock_and_publish`]. `try_lock` fails instead of waiting
/// when the worker is copying the buffer or has not taken the previous message.
///
/// Dropping the publisher stops the worker without waiting for it. A message the
/// sink is still blocked on is finished or abandoned on the worker thread.
pub struct RealtimePublisher<M> {
    shared: Arc<Shared<M>>,
    wake: flume::Sender<()>,
}

impl<M> RealtimePublisher<M>
where
    M: Clone + Send + 'static,
{
    pub fn new<S>(initial: M, sink: S) -> Result<Self, Error>
    where
        S: ReportSink<M>,
    {
        let shared = Arc::new(Shared {
            msg: Mutex::new(initial),
            pending: AtomicBool::new(false),
        });
        // Capacity one: a wake-up that is already queued covers any later hand-off.
        let (wake, woken) = flume::bounded(1);
        let worker_shared = shared.clone();
        // Detached: the worker exits once the wake channel disconnects.
        thread::Builder::new()
            .name("cartvel-publisher".into())
            .spawn(move || run_worker(&worker_shared, &woken, sink))
            .map_err(Error::Spawn)?;
        Ok(Self { shared, wake })
    }

    /// Tries to take the message buffer without blocking.
    pub fn try_lock(&self) -> Option<PublishGuard<'_, M>> {
        if self.shared.pending.load(Ordering::Acquire) {
            return None;
        }
        let msg = self.shared.msg.try_lock()?;
        if self.shared.pending.load(Ordering::Acquire) {
            return None;
        }
        Some(PublishGuard {
            msg,
            pending: &self.shared.pending,
            wake: &self.wake,
        })
    }

    /// Returns whether a message is waiting to be taken by the worker.
    pub fn is_pending(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire)
    }
}

fn run_worker<M, S>(shared: &Shared<M>, woken: &flume::Receiver<()>, mut sink: S)
where
    M: Clone,
    S: ReportSink<M>,
{
    let mut failing = false;
    while woken.recv().is_ok() {
        let msg = {
            let guard = shared.msg.lock();
            if !shared.pending.swap(false, Ordering::AcqRel) {
                continue;
            }
            M::clone(&guard)
        };
        match sink.publish(msg) {
            Ok(()) => {
                if failing {
                    info!("report sink recovered");
                    failing = false;
                }
            }
            Err(e) => {
                if !failing {
                    warn!("failed to publish report: {e}");
                    failing = true;
                }
            }
        }
    }
    debug!("publisher worker stopped");
}

impl<M> fmt::Debug for RealtimePublisher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimePublisher")
            .field("pending", &self.shared.pending.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Exclusive access to the message buffer of a [`RealtimePublisher`].
///
/// Dropping the guard without calling
/// [`unlock_and_publish`](Self::unlock_and_publish) releases the buffer and
/// publishes nothing.
pub struct PublishGuard<'a, M> {
    msg: MutexGuard<'a, M>,
    pending: &'a AtomicBool,
    wake: &'a flume::Sender<()>,
}

impl<M> PublishGuard<'_, M> {
    /// Releases the buffer and hands the message to the worker.
    pub fn unlock_and_publish(self) {
        let Self { msg, pending, wake } = self;
        pending.store(true, Ordering::Release);
        drop(msg);
        // Full means the worker already has a wake-up queued.
        let _ = wake.try_send(());
    }
}

impl<M> Deref for PublishGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.msg
    }
}

impl<M> DerefMut for PublishGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.msg
    }
}

impl<M> fmt::Debug for PublishGuard<'_, M>
where
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishGuard")
            .field("msg", &*self.msg)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_publish_reaches_sink() {
        let (tx, rx) = flume::unbounded();
        let publisher = RealtimePublisher::new(0_u32, tx).unwrap();

        let mut guard = publisher.try_lock().unwrap();
        *guard = 42;
        guard.unlock_and_publish();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn test_dropped_guard_publishes_nothing() {
        let (tx, rx) = flume::unbounded();
        let publisher = RealtimePublisher::new(0_u32, tx).unwrap();
        {
            let mut guard = publisher.try_lock().unwrap();
            *guard = 1;
        }
        assert!(!publisher.is_pending());
        drop(publisher);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_busy_while_consumer_blocked() {
        // Rendezvous channel: the worker blocks in `send` until we receive.
        let (tx, rx) = flume::bounded(0);
        let publisher = RealtimePublisher::new(0_u32, tx).unwrap();

        let guard = publisher.try_lock().unwrap();
        guard.unlock_and_publish();
        // Until the worker takes the first message the buffer stays pending.
        let mut published = 1;
        for i in 0..1000 {
            match publisher.try_lock() {
                Some(mut guard) => {
                    *guard = i;
                    guard.unlock_and_publish();
                    published += 1;
                }
                None => thread::sleep(Duration::from_millis(1)),
            }
        }
        // One message is stuck in the sink and at most one waits in the buffer.
        assert!(published <= 2, "{published}");

        let mut received = 0;
        while rx.recv_timeout(Duration::from_millis(500)).is_ok() {
            received += 1;
        }
        assert_eq!(received, published);
        assert!(publisher.try_lock().is_some());
    }

    #[test]
    fn test_drop_does_not_wait_for_blocked_sink() {
        // The receiver stays alive but never receives, so the worker blocks in `send`.
        let (tx, rx) = flume::bounded(0);
        let publisher = RealtimePublisher::new(0_u32, tx).unwrap();
        let guard = publisher.try_lock().unwrap();
        guard.unlock_and_publish();
        while publisher.is_pending() {
            thread::sleep(Duration::from_millis(1));
        }

        let (done_tx, done_rx) = flume::bounded(1);
        thread::spawn(move || {
            drop(publisher);
            done_tx.send(()).unwrap();
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());

        // The detached worker still delivers the message it was blocked on.
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0);
    }

    #[test]
    fn test_sink_errors_do_not_stop_worker() {
        let (tx, rx) = flume::unbounded();
        let mut calls = 0;
        let sink = FnSink(move |msg: u32| {
            calls += 1;
            if calls == 1 {
                return Err(Error::Disconnected);
            }
            tx.send(msg).map_err(|_| Error::Disconnected)
        });
        let publisher = RealtimePublisher::new(0_u32, Box::new(sink) as Box<dyn ReportSink<u32>>)
            .unwrap();

        for value in [1, 2] {
            let mut guard = loop {
                if let Some(guard) = publisher.try_lock() {
                    break guard;
                }
                thread::sleep(Duration::from_millis(1));
            };
            *guard = value;
            guard.unlock_and_publish();
        }
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
    }

    #[test]
    fn test_tracing_sink() {
        let publisher = RealtimePublisher::new(String::new(), TracingSink).unwrap();
        let mut guard = publisher.try_lock().unwrap();
        guard.push_str("report");
        guard.unlock_and_publish();
        drop(publisher);
    }
}
