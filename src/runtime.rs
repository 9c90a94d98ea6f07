use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEvent};
use tracing::{debug, trace};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum LapEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    /// Redraw request from the running stopwatch; carries no payload.
    Tick,
    /// The terminal input reader stopped; nothing more will arrive from it.
    Closed,
}

/// Source of events for the main loop
pub trait LapEventSource {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<LapEvent, RecvTimeoutError>;
    /// Take an already queued event without blocking.
    fn try_recv(&self) -> Result<LapEvent, TryRecvError>;
}

/// Production event source: terminal input and redraw ticks share one channel.
pub struct CrosstermEventSource {
    tx: Sender<LapEvent>,
    rx: Receiver<LapEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        thread::spawn(move || loop {
            let evt = match event::read() {
                // Windows reports releases too; only presses drive the stopwatch
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => LapEvent::Key(key),
                Ok(CtEvent::Mouse(mouse)) => LapEvent::Mouse(mouse),
                Ok(CtEvent::Resize(_, _)) => LapEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "terminal event reader stopped");
                    let _ = input_tx.send(LapEvent::Closed);
                    break;
                }
            };
            if input_tx.send(evt).is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    /// Sender that redraw tasks use to feed ticks into this source.
    pub fn sender(&self) -> Sender<LapEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LapEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<LapEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Result<LapEvent, TryRecvError> {
        self.rx.try_recv()
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<LapEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<LapEvent>) -> Self {
        Self { rx }
    }
}

impl LapEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<LapEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Result<LapEvent, TryRecvError> {
        self.rx.try_recv()
    }
}

/// Runner that hands the application one event at a time
pub struct Runner<E: LapEventSource> {
    event_source: E,
    idle_timeout: Duration,
}

impl<E: LapEventSource> Runner<E> {
    pub fn new(event_source: E, idle_timeout: Duration) -> Self {
        Self {
            event_source,
            idle_timeout,
        }
    }

    /// Blocks up to the idle timeout for the next event.
    ///
    /// `Ok(None)` means the timeout passed quietly; `Err` means every sender
    /// is gone and no event can ever arrive. Ticks that piled up behind a
    /// slow redraw are collapsed into one, so a redraw never runs more than
    /// once per loop iteration.
    pub fn step(&self) -> Result<Option<LapEvent>, RecvError> {
        let ev = match self.event_source.recv_timeout(self.idle_timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => return Err(RecvError),
        };

        if !matches!(ev, LapEvent::Tick) {
            return Ok(Some(ev));
        }

        let mut coalesced = 0usize;
        loop {
            match self.event_source.try_recv() {
                Ok(LapEvent::Tick) => coalesced += 1,
                Ok(other) => {
                    if coalesced > 0 {
                        trace!(coalesced, "collapsed queued ticks");
                    }
                    // input behind the ticks wins; the next running tick redraws anyway
                    return Ok(Some(other));
                }
                Err(_) => break,
            }
        }
        Ok(Some(LapEvent::Tick))
    }
}

/// Handle to an active repeating redraw. Cancelling (or dropping) stops it.
pub trait RedrawHandle {
    fn cancel(self: Box<Self>);
}

/// Starts repeating redraw tasks.
pub trait RedrawScheduler {
    fn schedule(&mut self, interval: Duration) -> Box<dyn RedrawHandle>;
}

/// Sends [`LapEvent::Tick`] from a background thread until cancelled.
pub struct ThreadRedrawScheduler {
    tx: Sender<LapEvent>,
}

impl ThreadRedrawScheduler {
    pub fn new(tx: Sender<LapEvent>) -> Self {
        Self { tx }
    }
}

impl RedrawScheduler for ThreadRedrawScheduler {
    fn schedule(&mut self, interval: Duration) -> Box<dyn RedrawHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let tx = self.tx.clone();

        thread::spawn(move || {
            while !flag.load(Ordering::Acquire) {
                if tx.send(LapEvent::Tick).is_err() {
                    break;
                }
                thread::sleep(interval);
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, "redraw task started");
        Box::new(ThreadRedrawHandle { cancelled })
    }
}

struct ThreadRedrawHandle {
    cancelled: Arc<AtomicBool>,
}

impl RedrawHandle for ThreadRedrawHandle {
    fn cancel(self: Box<Self>) {
        // Drop does the work
    }
}

impl Drop for ThreadRedrawHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Scheduler that only counts tasks, for driving the stopwatch by hand.
#[derive(Debug, Clone, Default)]
pub struct CountingScheduler {
    active: Arc<AtomicUsize>,
    started: Arc<AtomicUsize>,
}

impl CountingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks currently scheduled and not yet cancelled.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Tasks ever scheduled.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl RedrawScheduler for CountingScheduler {
    fn schedule(&mut self, _interval: Duration) -> Box<dyn RedrawHandle> {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::SeqCst);
        Box::new(CountingHandle {
            active: self.active.clone(),
        })
    }
}

struct CountingHandle {
    active: Arc<AtomicUsize>,
}

impl RedrawHandle for CountingHandle {
    fn cancel(self: Box<Self>) {}
}

impl Drop for CountingHandle {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
