use crate::history::{DetectionHistory, DetectionRecord};
use crate::presence::{PhraseChooser, PresenceMachine, PresenceState, REVERT_AFTER, TimerHandle};
use crate::protocol::{ClientEnvelope, override_threshold_envelope};
use crate::render::{
    MonitorView, render_banner, render_feedback, render_history, render_threshold,
};
use crate::threshold::ThresholdSync;
use crate::transport::TransportEvent;
use chrono::{Local, TimeZone};
use std::fmt::{self, Display};
use std::time::Duration;

/// Side effect requested by a handler, carried out by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Emit(ClientEnvelope),
    ArmRevertTimer { handle: TimerHandle, after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Lost,
}

/// Owns all per-session UI state. Every handler runs to completion and
/// returns the commands it needs executed.
pub struct MonitorController {
    history: DetectionHistory,
    presence: PresenceMachine,
    threshold: ThresholdSync,
    connection: ConnectionStatus,
    chooser: Box<dyn PhraseChooser + Send>,
}

impl fmt::Debug for MonitorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorController")
            .field("history", &self.history)
            .field("presence", &self.presence)
            .field("threshold", &self.threshold)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl MonitorController {
    pub fn new(chooser: Box<dyn PhraseChooser + Send>) -> Self {
        Self {
            history: DetectionHistory::new(),
            presence: PresenceMachine::new(),
            threshold: ThresholdSync::new(),
            connection: ConnectionStatus::default(),
            chooser,
        }
    }

    pub fn presence(&self) -> PresenceState {
        self.presence.state()
    }

    pub fn threshold(&self) -> &ThresholdSync {
        &self.threshold
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn handle_transport(&mut self, event: TransportEvent) -> Vec<Command> {
        match event {
            TransportEvent::Connected => self.on_connected(),
            TransportEvent::Disconnected => self.on_disconnected(),
            TransportEvent::Detection(record) => self.on_detection(record),
        }
    }

    /// Clears the banner and re-sends the current threshold so the backend
    /// holds the value the UI shows.
    pub fn on_connected(&mut self) -> Vec<Command> {
        self.connection = ConnectionStatus::Connected;
        vec![self.broadcast(self.threshold.value())]
    }

    pub fn on_disconnected(&mut self) -> Vec<Command> {
        self.connection = ConnectionStatus::Lost;
        Vec::new()
    }

    pub fn on_detection(&mut self, record: DetectionRecord) -> Vec<Command> {
        self.history.record(record);
        let handle = self.presence.on_detection(self.chooser.as_mut());

        vec![Command::ArmRevertTimer {
            handle,
            after: REVERT_AFTER,
        }]
    }

    /// Returns `true` if the view changed.
    pub fn on_revert_timer(&mut self, handle: TimerHandle) -> bool {
        self.presence.on_timer(handle)
    }

    pub fn on_slider_moved(&mut self, raw: f64) -> Vec<Command> {
        let value = self.threshold.on_continuous_input(raw);
        vec![self.broadcast(value)]
    }

    pub fn on_threshold_edited(&mut self, raw: &str) -> Vec<Command> {
        let value = self.threshold.on_discrete_input(raw);
        vec![self.broadcast(value)]
    }

    /// Focus entering the text field marks the user as editing; focus
    /// leaving commits the typed text.
    pub fn on_threshold_focus(&mut self, focused: bool) -> Vec<Command> {
        if focused {
            self.threshold.set_user_editing(true);
            return Vec::new();
        }

        let value = self.threshold.on_discrete_blur();
        vec![self.broadcast(value)]
    }

    pub fn on_threshold_reset(&mut self) -> Vec<Command> {
        let value = self.threshold.on_reset();
        vec![self.broadcast(value)]
    }

    pub fn view(&self) -> MonitorView {
        self.view_in(&Local)
    }

    pub fn view_in<Tz>(&self, tz: &Tz) -> MonitorView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        MonitorView {
            history: render_history(&self.history, tz),
            feedback: render_feedback(self.presence.state()),
            threshold: render_threshold(&self.threshold),
            banner: render_banner(self.connection == ConnectionStatus::Lost),
        }
    }

    fn broadcast(&self, value: f64) -> Command {
        Command::Emit(override_threshold_envelope(value))
    }
}
