//! Bounded, time-flushed log pipeline.
//!
//! ```text
//! tail ──lines──▶ mpsc ──▶ pump_logs ──▶ LogBuffer ──flush(count, lines)──▶ LogSink
//!                            ▲   ▲
//!                  flush tick┘   └ cancel
//! ```
//!
//! A flush hands the sink the buffer's backing slots together with the filled
//! prefix length. Slots past that length may hold lines from an earlier fill
//! and must not be read.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::access::Tailable;
use crate::streaming::{TaskScope, TaskSlot};
use crate::structs::LogOptions;

pub const LOG_BUFFER_SIZE: usize = 100;
pub const FLUSH_TIMEOUT: Duration = Duration::from_millis(200);

/// Receiver of flushed batches.
pub trait LogSink: Send {
    /// Appends `lines[..count]` to the scrollback.
    fn flush(&mut self, count: usize, lines: &[String]);
}

/// Fixed-capacity line buffer drained on flush.
#[derive(Debug)]
pub struct LogBuffer {
    slots: Vec<String>,
    cursor: usize,
}

impl LogBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![String::new(); capacity.max(1)],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.slots.len()
    }

    /// Stores `line`, flushing the current fill first when no slot is left.
    /// Returns true if a flush happened.
    pub fn push<S: LogSink + ?Sized>(&mut self, line: String, sink: &mut S) -> bool {
        let flushed = self.is_full() && self.flush_into(sink) > 0;
        self.slots[self.cursor] = line;
        self.cursor += 1;
        flushed
    }

    /// Hands the filled prefix to `sink` and resets the cursor. An empty
    /// buffer is a no-op. Returns the number of lines flushed.
    pub fn flush_into<S: LogSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let count = self.cursor;
        if count > 0 {
            sink.flush(count, &self.slots);
            self.cursor = 0;
        }
        count
    }
}

/// Why [`pump_logs`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// Source ended; the remainder was flushed.
    Closed,
    /// Cancelled; any partial fill was dropped.
    Cancelled,
}

/// Drains `rx` into a buffer of `capacity` lines, flushing when it fills and
/// every `period` until the source closes or `token` fires.
pub async fn pump_logs<S: LogSink + ?Sized>(
    mut rx: mpsc::Receiver<String>,
    sink: &mut S,
    capacity: usize,
    period: Duration,
    token: CancellationToken,
) -> PumpExit {
    let mut buf = LogBuffer::with_capacity(capacity);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(dropped = buf.len(), "log pump cancelled");
                return PumpExit::Cancelled;
            }
            line = rx.recv() => match line {
                Some(line) => {
                    buf.push(line, sink);
                }
                None => {
                    buf.flush_into(sink);
                    return PumpExit::Closed;
                }
            },
            _ = ticker.tick() => {
                buf.flush_into(sink);
            }
        }
    }
}

/// What a log session reports to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Lines(Vec<String>),
    /// Stream failure, reported once per session.
    Error(String),
    Closed,
}

/// A [`LogEvent`] tagged with the session that produced it, so a view can
/// drop anything still queued from a replaced session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogUpdate {
    pub session: u64,
    pub event: LogEvent,
}

/// Sink forwarding batches to the view's event channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    session: u64,
    tx: mpsc::UnboundedSender<LogUpdate>,
}

impl ChannelSink {
    pub fn new(session: u64, tx: mpsc::UnboundedSender<LogUpdate>) -> Self {
        Self { session, tx }
    }

    pub fn send(&self, event: LogEvent) {
        if self.tx.send(LogUpdate { session: self.session, event }).is_err() {
            debug!(session = self.session, "log view gone, dropping event");
        }
    }
}

impl LogSink for ChannelSink {
    fn flush(&mut self, count: usize, lines: &[String]) {
        self.send(LogEvent::Lines(lines[..count].to_vec()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub capacity: usize,
    pub period: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            capacity: LOG_BUFFER_SIZE,
            period: FLUSH_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    Idle,
    Running,
    Stopped,
}

/// Owns at most one running tail and its pump.
#[derive(Debug, Default)]
pub struct LogSession {
    slot: TaskSlot,
    started: bool,
    session: u64,
}

impl LogSession {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LogState {
        match (self.started, self.slot.is_active()) {
            (false, _) => LogState::Idle,
            (true, true) => LogState::Running,
            (true, false) => LogState::Stopped,
        }
    }

    /// Id of the current (or last) session, as carried by its [`LogUpdate`]s.
    pub fn id(&self) -> u64 {
        self.session
    }

    /// Starts tailing `opts` into `events`, replacing any running session.
    #[tracing::instrument(skip(self, source, events), fields(fqn = %opts.fqn))]
    pub fn start<T>(
        &mut self,
        source: Arc<T>,
        opts: LogOptions,
        settings: LogSettings,
        events: mpsc::UnboundedSender<LogUpdate>,
    ) -> u64
    where
        T: Tailable + 'static,
    {
        self.session += 1;
        self.started = true;
        let mut sink = ChannelSink::new(self.session, events);

        let scope = TaskScope::spawn("logs", move |token| async move {
            let (tx, rx) = mpsc::channel(settings.capacity.max(1));
            let fqn = opts.fqn.to_string();
            let tail = source.tail(token.child_token(), tx, opts);
            let pump = pump_logs(rx, &mut sink, settings.capacity, settings.period, token);
            let (tailed, exit) = tokio::join!(tail, pump);

            if exit == PumpExit::Cancelled {
                return;
            }
            if let Err(e) = tailed {
                warn!(fqn = %fqn, error = %e, "log stream failed");
                sink.send(LogEvent::Error(e.to_string()));
            }
            sink.send(LogEvent::Closed);
        });

        self.slot.replace(scope);
        self.session
    }

    /// Stops the running session, if any. Idempotent.
    pub fn stop(&mut self) {
        self.slot.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessError;
    use crate::structs::Fqn;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        flushes: Vec<(usize, Vec<String>)>,
    }

    impl LogSink for Recorder {
        fn flush(&mut self, count: usize, lines: &[String]) {
            self.flushes.push((count, lines[..count].to_vec()));
        }
    }

    /// Records the paused-clock instant of each flush.
    struct Timed {
        start: Instant,
        flushes: Arc<Mutex<Vec<(Duration, usize)>>>,
    }

    impl LogSink for Timed {
        fn flush(&mut self, count: usize, _lines: &[String]) {
            if let Ok(mut f) = self.flushes.lock() {
                f.push((self.start.elapsed(), count));
            }
        }
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_buffer_flushes_filled_prefix_only() {
        let mut sink = Recorder::default();
        assert_eq!(LogBuffer::with_capacity(0).capacity(), 1);
        let mut buf = LogBuffer::with_capacity(3);
        for l in lines(3) {
            buf.push(l, &mut sink);
        }
        assert!(buf.is_full());
        assert!(sink.flushes.is_empty());

        assert!(buf.push("next".into(), &mut sink));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.flush_into(&mut sink), 1);
        assert_eq!(buf.flush_into(&mut sink), 0);

        assert_eq!(sink.flushes.len(), 2);
        assert_eq!(sink.flushes[0].0, 3);
        assert_eq!(sink.flushes[1], (1, vec!["next".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_flushes_on_capacity_then_close() {
        let (tx, rx) = mpsc::channel(32);
        for l in lines(11) {
            tx.send(l).await.expect("send");
        }
        drop(tx);

        let mut sink = Recorder::default();
        let exit = pump_logs(rx, &mut sink, 10, FLUSH_TIMEOUT, CancellationToken::new()).await;

        assert_eq!(exit, PumpExit::Closed);
        let counts: Vec<_> = sink.flushes.iter().map(|(c, _)| *c).collect();
        assert_eq!(counts, vec![10, 1]);
        assert_eq!(sink.flushes[1].1, vec!["line 10".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_flushes_single_line() {
        let (tx, rx) = mpsc::channel(8);
        let token = CancellationToken::new();
        let flushes = Arc::new(Mutex::new(Vec::new()));
        let mut sink = Timed {
            start: Instant::now(),
            flushes: flushes.clone(),
        };

        let pump = tokio::spawn({
            let token = token.clone();
            async move { pump_logs(rx, &mut sink, LOG_BUFFER_SIZE, FLUSH_TIMEOUT, token).await }
        });

        tx.send("hello".into()).await.expect("send");
        time::sleep(Duration::from_millis(250)).await;

        let seen = flushes.lock().expect("lock").clone();
        assert_eq!(seen, vec![(Duration::from_millis(200), 1)]);

        token.cancel();
        assert_eq!(pump.await.expect("join"), PumpExit::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_rearms_after_each_flush() {
        let (tx, rx) = mpsc::channel(8);
        let token = CancellationToken::new();
        let flushes = Arc::new(Mutex::new(Vec::new()));
        let mut sink = Timed {
            start: Instant::now(),
            flushes: flushes.clone(),
        };

        let pump = tokio::spawn({
            let token = token.clone();
            async move { pump_logs(rx, &mut sink, LOG_BUFFER_SIZE, FLUSH_TIMEOUT, token).await }
        });

        tx.send("first".into()).await.expect("send");
        time::sleep(Duration::from_millis(250)).await;
        tx.send("second".into()).await.expect("send");
        time::sleep(Duration::from_millis(200)).await;

        let ms = Duration::from_millis;
        let seen = flushes.lock().expect("lock").clone();
        assert_eq!(seen, vec![(ms(200), 1), (ms(400), 1)]);

        // The 600ms tick finds nothing buffered.
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(flushes.lock().expect("lock").len(), 2);

        tx.send("third".into()).await.expect("send");
        time::sleep(Duration::from_millis(200)).await;
        let seen = flushes.lock().expect("lock").clone();
        assert_eq!(seen, vec![(ms(200), 1), (ms(400), 1), (ms(800), 1)]);

        token.cancel();
        assert_eq!(pump.await.expect("join"), PumpExit::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_partial_fill() {
        let (tx, rx) = mpsc::channel(8);
        let token = CancellationToken::new();
        tx.send("pending".into()).await.expect("send");
        token.cancel();

        let mut sink = Recorder::default();
        let exit = pump_logs(rx, &mut sink, 10, FLUSH_TIMEOUT, token).await;
        assert_eq!(exit, PumpExit::Cancelled);
        assert!(sink.flushes.is_empty());
    }

    struct FakeTail {
        lines: Vec<String>,
        fail: bool,
    }

    impl Tailable for FakeTail {
        async fn containers(&self, _fqn: &Fqn) -> Result<Vec<String>, AccessError> {
            Ok(vec!["app".into()])
        }

        async fn tail(
            &self,
            cancel: CancellationToken,
            out: mpsc::Sender<String>,
            opts: LogOptions,
        ) -> Result<(), AccessError> {
            for line in &self.lines {
                if cancel.is_cancelled() || out.send(line.clone()).await.is_err() {
                    return Ok(());
                }
            }
            if self.fail {
                return Err(AccessError::Stream {
                    fqn: opts.fqn.to_string(),
                    reason: "connection reset".into(),
                });
            }
            Ok(())
        }
    }

    async fn collect(rx: &mut mpsc::UnboundedReceiver<LogUpdate>) -> Vec<LogEvent> {
        let mut events = Vec::new();
        while let Some(update) = rx.recv().await {
            let closed = update.event == LogEvent::Closed;
            events.push(update.event);
            if closed {
                break;
            }
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_to_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LogSession::idle();
        assert_eq!(session.state(), LogState::Idle);

        let source = Arc::new(FakeTail {
            lines: lines(3),
            fail: false,
        });
        session.start(source, LogOptions::default(), LogSettings::default(), tx);

        let events = collect(&mut rx).await;
        assert_eq!(events, vec![LogEvent::Lines(lines(3)), LogEvent::Closed]);

        while session.state() == LogState::Running {
            tokio::task::yield_now().await;
        }
        assert_eq!(session.state(), LogState::Stopped);
        session.stop();
        session.stop();
        assert_eq!(session.state(), LogState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_reports_stream_error_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LogSession::idle();
        let source = Arc::new(FakeTail {
            lines: lines(1),
            fail: true,
        });
        session.start(source, LogOptions::default(), LogSettings::default(), tx);

        let events = collect(&mut rx).await;
        let errors = events
            .iter()
            .filter(|e| matches!(e, LogEvent::Error(_)))
            .count();
        assert_eq!(errors, 1);
        assert_eq!(events.first(), Some(&LogEvent::Lines(lines(1))));
        assert_eq!(events.last(), Some(&LogEvent::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_replaces_previous_session() {
        struct Endless;
        impl Tailable for Endless {
            async fn containers(&self, _fqn: &Fqn) -> Result<Vec<String>, AccessError> {
                Ok(Vec::new())
            }
            async fn tail(
                &self,
                cancel: CancellationToken,
                _out: mpsc::Sender<String>,
                _opts: LogOptions,
            ) -> Result<(), AccessError> {
                cancel.cancelled().await;
                Ok(())
            }
        }

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = LogSession::idle();
        let first = session.start(Arc::new(Endless), LogOptions::default(), LogSettings::default(), tx.clone());
        let second = session.start(Arc::new(Endless), LogOptions::default(), LogSettings::default(), tx);

        assert_ne!(first, second);
        assert_eq!(session.id(), second);
        assert_eq!(session.state(), LogState::Running);

        session.stop();
        assert_eq!(session.state(), LogState::Stopped);
    }
}
