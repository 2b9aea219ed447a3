//! Exclusive subscriptions to an input byte stream.
//!
//! An [`InputHub`] forwards raw chunks to at most one [`InputSubscription`]
//! at a time. The subscription is an owned object: dropping it (or calling
//! [`InputSubscription::unsubscribe`]) detaches it, and from then on nothing
//! it would have received is delivered anywhere. Chunks published while no
//! one is subscribed are discarded.
//!
//! The process-wide stdin hub is fed by a dedicated reader thread, started
//! on first use. The thread only reads while a subscription is live: between
//! prompts it parks, and bytes typed meanwhile stay in the terminal for the
//! application or a child process to read.

use std::io::{self, Read};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{PromptError, Result};

#[derive(Debug, Default)]
struct HubState {
    sender: Option<mpsc::UnboundedSender<Vec<u8>>>,
    /// Identifies the current subscription so a stale one cannot detach its successor.
    generation: u64,
    /// The underlying stream has ended.
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<HubState>,
    /// Signalled when a subscription starts or the stream closes.
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HubState {
    fn is_subscribed(&self) -> bool {
        self.sender.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

/// Fan-in point for one byte stream with a single exclusive consumer.
#[derive(Debug, Clone, Default)]
pub struct InputHub {
    shared: Arc<Shared>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.shared.lock()
    }

    /// Take the stream. Fails with [`PromptError::SessionBusy`] while another
    /// subscription is live.
    ///
    /// After the stream has closed the subscription ends immediately.
    pub fn subscribe(&self) -> Result<InputSubscription> {
        let mut state = self.lock();
        if state.is_subscribed() {
            return Err(PromptError::SessionBusy);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.generation += 1;
        state.sender = if state.closed { None } else { Some(tx) };
        debug!(generation = state.generation, "input subscribed");
        self.shared.changed.notify_all();

        Ok(InputSubscription {
            rx,
            hub: Arc::clone(&self.shared),
            generation: state.generation,
        })
    }

    /// Deliver a chunk to the current subscriber. Returns false if there is none.
    pub fn publish(&self, bytes: &[u8]) -> bool {
        let state = self.lock();
        match &state.sender {
            Some(tx) => tx.send(bytes.to_vec()).is_ok(),
            None => false,
        }
    }

    /// Mark the stream as ended; the current subscriber sees end-of-input.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.sender = None;
        self.shared.changed.notify_all();
    }

    pub fn has_subscriber(&self) -> bool {
        self.lock().is_subscribed()
    }

    /// Block the calling thread until a subscription is live. Returns false
    /// once the stream has closed.
    fn wait_for_subscriber(&self) -> bool {
        let mut state = self.lock();
        loop {
            if state.closed {
                return false;
            }
            if state.is_subscribed() {
                return true;
            }
            state = self
                .shared
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// The right to receive input chunks. Owned by exactly one session.
#[derive(Debug)]
pub struct InputSubscription {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    hub: Arc<Shared>,
    generation: u64,
}

impl InputSubscription {
    /// Next chunk, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Detach from the hub. Equivalent to dropping.
    pub fn unsubscribe(self) {}
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        self.rx.close();
        let mut state = self.hub.lock();
        if state.generation == self.generation {
            state.sender = None;
            debug!(generation = self.generation, "input unsubscribed");
        }
    }
}

/// How long the reader waits for input before re-checking the subscription.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A blocking byte stream the reader thread can wait on.
pub(crate) trait ByteSource {
    /// Wait up to `timeout` for input. `Ok(true)` means a read will not block.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

struct Stdin(io::Stdin);

impl ByteSource for Stdin {
    #[cfg(unix)]
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let mut fd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
        // SAFETY: `fd` is a valid pollfd for the duration of the call.
        let ready = unsafe { libc::poll(&mut fd, 1, millis) };
        if ready < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ready > 0)
    }

    /// No readiness check here; the next read blocks until input arrives.
    #[cfg(not(unix))]
    fn wait_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().read(buf)
    }
}

/// The process-wide hub fed from stdin.
pub fn stdin_hub() -> &'static InputHub {
    static HUB: OnceLock<InputHub> = OnceLock::new();
    HUB.get_or_init(|| {
        let hub = InputHub::new();
        spawn_stdin_reader(hub.clone());
        hub
    })
}

fn spawn_stdin_reader(hub: InputHub) {
    let spawned = thread::Builder::new()
        .name("spark-prompt-stdin".to_string())
        .spawn(move || read_loop(&hub, Stdin(io::stdin())));
    if let Err(err) = spawned {
        warn!(error = %err, "failed to start stdin reader");
    }
}

/// Pump `source` into `hub` until end of stream. Reads happen only while a
/// subscription is live.
pub(crate) fn read_loop<S: ByteSource>(hub: &InputHub, mut source: S) {
    let mut buf = [0u8; 256];

    while hub.wait_for_subscriber() {
        match source.wait_readable(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "input poll failed");
                break;
            }
        }
        // The subscriber may have left while we were waiting.
        if !hub.has_subscriber() {
            continue;
        }
        match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                hub.publish(&buf[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "input read failed");
                break;
            }
        }
    }
    debug!("input reader stopped");
    hub.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc as std_mpsc;

    /// Source fed by the test. Waiting peeks at the next chunk without
    /// consuming it; only `read` counts as taking bytes.
    struct Fed {
        chunks: std_mpsc::Receiver<Vec<u8>>,
        peeked: Option<Vec<u8>>,
        reads: Arc<AtomicUsize>,
    }

    impl ByteSource for Fed {
        fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
            if self.peeked.is_some() {
                return Ok(true);
            }
            match self.chunks.recv_timeout(timeout) {
                Ok(chunk) => {
                    self.peeked = Some(chunk);
                    Ok(true)
                }
                Err(std_mpsc::RecvTimeoutError::Timeout) => Ok(false),
                Err(std_mpsc::RecvTimeoutError::Disconnected) => Ok(true),
            }
        }

        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let Some(chunk) = self.peeked.take() else {
                return Ok(0);
            };
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn reader_leaves_input_alone_without_subscriber() {
        let hub = InputHub::new();
        let (feed, chunks) = std_mpsc::channel();
        let reads = Arc::new(AtomicUsize::new(0));
        let source = Fed {
            chunks,
            peeked: None,
            reads: Arc::clone(&reads),
        };
        let reader = {
            let hub = hub.clone();
            thread::spawn(move || read_loop(&hub, source))
        };

        feed.send(b"early".to_vec()).expect("feed");
        settle().await;
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        // Input typed before the prompt is still there for it.
        let mut sub = hub.subscribe().expect("subscribe");
        assert_eq!(sub.recv().await, Some(b"early".to_vec()));
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        settle().await;
        feed.send(b"later".to_vec()).expect("feed");
        settle().await;
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        let mut next = hub.subscribe().expect("resubscribe");
        assert_eq!(next.recv().await, Some(b"later".to_vec()));

        drop(feed);
        assert_eq!(next.recv().await, None);
        reader.join().expect("reader thread");
    }

    #[tokio::test]
    async fn delivers_to_current_subscriber() {
        let hub = InputHub::new();
        let mut sub = hub.subscribe().expect("subscribe");
        assert!(hub.publish(b"hi"));
        assert_eq!(sub.recv().await, Some(b"hi".to_vec()));
    }

    #[tokio::test]
    async fn second_subscriber_is_refused() {
        let hub = InputHub::new();
        let _first = hub.subscribe().expect("subscribe");
        assert!(matches!(hub.subscribe(), Err(PromptError::SessionBusy)));
    }

    #[tokio::test]
    async fn dropped_subscription_stops_delivery() {
        let hub = InputHub::new();
        let sub = hub.subscribe().expect("subscribe");
        sub.unsubscribe();
        assert!(!hub.has_subscriber());
        assert!(!hub.publish(b"lost"));

        let mut next = hub.subscribe().expect("resubscribe");
        assert!(hub.publish(b"fresh"));
        assert_eq!(next.recv().await, Some(b"fresh".to_vec()));
    }

    #[tokio::test]
    async fn stale_drop_does_not_detach_successor() {
        let hub = InputHub::new();
        let first = hub.subscribe().expect("subscribe");
        // Simulate a subscription whose receiver closed before it was dropped.
        hub.lock().sender = None;
        let mut second = hub.subscribe().expect("subscribe");
        drop(first);
        assert!(hub.publish(b"ok"));
        assert_eq!(second.recv().await, Some(b"ok".to_vec()));
    }

    #[tokio::test]
    async fn close_ends_the_stream() {
        let hub = InputHub::new();
        let mut sub = hub.subscribe().expect("subscribe");
        hub.close();
        assert_eq!(sub.recv().await, None);
        drop(sub);

        let mut late = hub.subscribe().expect("subscribe after close");
        assert_eq!(late.recv().await, None);
    }
}
