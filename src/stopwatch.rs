use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::clock::{time_diff_ms, Clock};
use crate::duration::RecordedTime;
use crate::records::{RecordList, Summary};
use crate::runtime::{RedrawHandle, RedrawScheduler};
use crate::store::KeyValueStore;

/// Storage key holding the JSON array of recorded times.
pub const RECORDS_KEY: &str = "recorded_times";

pub const DEFAULT_REDRAW_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { started_at: SystemTime },
}

/// The two on-screen controls that can hold input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Control {
    Toggle,
    Reset,
}

/// Label shown on the toggle control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ToggleLabel {
    Start,
    Stop,
}

/// Timer controller: owns the timer state, the view state and the record
/// history, and writes the history to the store after every change.
pub struct Stopwatch {
    state: TimerState,
    redraw: Option<Box<dyn RedrawHandle>>,
    redraw_interval: Duration,
    scheduler: Box<dyn RedrawScheduler>,
    clock: Box<dyn Clock>,
    store: Box<dyn KeyValueStore>,
    records: RecordList,
    summary: Summary,
    display: RecordedTime,
    label: ToggleLabel,
    focus: Control,
}

impl std::fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stopwatch")
            .field("state", &self.state)
            .field("redraw_active", &self.redraw.is_some())
            .field("redraw_interval", &self.redraw_interval)
            .field("records", &self.records)
            .field("display", &self.display)
            .field("label", &self.label)
            .field("focus", &self.focus)
            .finish()
    }
}

impl Stopwatch {
    /// Build the controller and load whatever history the store holds.
    pub fn new(
        store: Box<dyn KeyValueStore>,
        clock: Box<dyn Clock>,
        scheduler: Box<dyn RedrawScheduler>,
        redraw_interval: Duration,
    ) -> Self {
        let mut stopwatch = Self {
            state: TimerState::Idle,
            redraw: None,
            redraw_interval: redraw_interval.max(Duration::from_millis(1)),
            scheduler,
            clock,
            store,
            records: RecordList::new(),
            summary: Summary::default(),
            display: RecordedTime::ZERO,
            label: ToggleLabel::Start,
            focus: Control::Toggle,
        };
        stopwatch.load();
        stopwatch
    }

    fn load(&mut self) {
        self.records = load_records(self.store.as_ref());
        self.recompute_average();
    }

    /// Start when idle, stop when running.
    pub fn toggle_start(&mut self) {
        match self.state {
            TimerState::Idle => self.start(),
            TimerState::Running { .. } => self.stop(),
        }
    }

    fn start(&mut self) {
        if self.redraw.is_some() {
            return;
        }
        let now = self.clock.now();
        self.state = TimerState::Running { started_at: now };
        self.redraw = Some(self.scheduler.schedule(self.redraw_interval));
        self.label = ToggleLabel::Stop;
        self.focus = Control::Toggle;
        debug!("stopwatch started");
    }

    /// Stop a running timing and record it. When idle only the label and
    /// focus are refreshed.
    pub fn stop(&mut self) {
        if let Some(handle) = self.redraw.take() {
            handle.cancel();
        }

        if let TimerState::Running { started_at } = self.state {
            self.state = TimerState::Idle;
            let elapsed = RecordedTime::from_millis(time_diff_ms(started_at, self.clock.now()));
            self.display = elapsed;
            self.records.prepend(elapsed);
            self.recompute_average();
            self.persist();
            info!(elapsed = %elapsed, count = self.records.len(), "recorded time");
        }

        self.label = ToggleLabel::Start;
        self.focus = Control::Toggle;
    }

    /// Stop, then drop all history from memory and from the store.
    pub fn reset(&mut self) {
        self.stop();
        self.records.clear();
        if let Err(e) = self.store.remove(RECORDS_KEY) {
            warn!(error = %e, "could not clear stored times");
        }
        self.display = RecordedTime::ZERO;
        self.recompute_average();
        info!("recorded times reset");
    }

    /// Refresh the live display while running.
    pub fn tick(&mut self) {
        if let TimerState::Running { started_at } = self.state {
            self.display = RecordedTime::from_millis(time_diff_ms(started_at, self.clock.now()));
        }
    }

    pub fn recompute_average(&mut self) {
        self.summary = self.records.summary();
    }

    fn persist(&self) {
        let result = self
            .records
            .to_snapshot()
            .map_err(crate::error::LapwatchError::from)
            .and_then(|raw| self.store.set(RECORDS_KEY, &raw));
        if let Err(e) = result {
            warn!(error = %e, "could not save recorded times");
        }
    }

    /// Activate whichever control holds focus.
    pub fn activate_focused(&mut self) {
        match self.focus {
            Control::Toggle => self.toggle_start(),
            Control::Reset => self.reset(),
        }
        self.focus = Control::Toggle;
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Control::Toggle => Control::Reset,
            Control::Reset => Control::Toggle,
        };
    }

    /// A click anywhere hands focus back to the toggle control.
    pub fn on_click(&mut self) {
        self.focus = Control::Toggle;
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn redraw_active(&self) -> bool {
        self.redraw.is_some()
    }

    pub fn records(&self) -> &RecordList {
        &self.records
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn display(&self) -> RecordedTime {
        self.display
    }

    pub fn label(&self) -> ToggleLabel {
        self.label
    }

    pub fn focus(&self) -> Control {
        self.focus
    }
}

/// Read the stored history. Missing, unreadable or broken data is an empty list.
pub fn load_records(store: &dyn KeyValueStore) -> RecordList {
    let records = match store.get(RECORDS_KEY) {
        Ok(Some(raw)) => RecordList::from_snapshot(&raw),
        Ok(None) => RecordList::new(),
        Err(e) => {
            warn!(error = %e, "could not read recorded times, starting empty");
            RecordList::new()
        }
    };
    info!(count = records.len(), "loaded recorded times");
    records
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        if let Some(handle) = self.redraw.take() {
            handle.cancel();
        }
    }
}
