use crate::history::{DetectionHistory, DetectionRecord};
use crate::presence::PresenceState;
use crate::threshold::{ThresholdSync, format_threshold};
use chrono::TimeZone;
use std::fmt::Display;

pub const NO_DETECTIONS_PLACEHOLDER: &str = "No face detected yet";
pub const IDLE_FEEDBACK: &str = "System response will appear here";
pub const CONNECTION_LOST: &str = "Connection to the board lost. Please check the connection.";

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub summary: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryView {
    Placeholder(&'static str),
    Rows(Vec<HistoryRow>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackView {
    pub active: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdView {
    pub value: f64,
    pub label: String,
    /// `None` leaves the text field untouched.
    pub input_text: Option<String>,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BannerView {
    pub visible: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorView {
    pub history: HistoryView,
    pub feedback: FeedbackView,
    pub threshold: ThresholdView,
    pub banner: BannerView,
}

pub fn render_history<Tz>(history: &DetectionHistory, tz: &Tz) -> HistoryView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if history.is_empty() {
        return HistoryView::Placeholder(NO_DETECTIONS_PLACEHOLDER);
    }

    HistoryView::Rows(history.iter().map(|record| render_row(record, tz)).collect())
}

fn render_row<Tz>(record: &DetectionRecord, tz: &Tz) -> HistoryRow
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    HistoryRow {
        summary: format!(
            "{}% - {}",
            format_confidence_percent(record.confidence()),
            title_case(record.label())
        ),
        time: format_timestamp(record.timestamp_ms(), tz),
    }
}

pub fn render_feedback(state: PresenceState) -> FeedbackView {
    match state {
        PresenceState::Idle => FeedbackView {
            active: false,
            text: IDLE_FEEDBACK.to_string(),
        },
        PresenceState::Active { greeting } => FeedbackView {
            active: true,
            text: greeting.to_string(),
        },
    }
}

pub fn render_threshold(threshold: &ThresholdSync) -> ThresholdView {
    ThresholdView {
        value: threshold.value(),
        label: format_threshold(threshold.value()),
        input_text: (!threshold.is_user_editing()).then(|| threshold.input_text().to_string()),
        percent: threshold.percent(),
    }
}

pub fn render_banner(connection_lost: bool) -> BannerView {
    BannerView {
        visible: connection_lost,
        text: if connection_lost {
            CONNECTION_LOST.to_string()
        } else {
            String::new()
        },
    }
}

/// Confidence as a percentage truncated to one decimal place, printed
/// without a trailing `.0` (`0.8234` -> `82.3`, `0.5` -> `50`).
pub fn format_confidence_percent(confidence: f64) -> String {
    let tenths = (confidence * 1000.0).floor() / 10.0;
    format!("{tenths}")
}

/// `D/M/YYYY - HH:MM:SS` in the given zone.
pub fn format_timestamp<Tz>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_millis_opt(timestamp_ms).single() {
        Some(at) => at.format("%-d/%-m/%Y - %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
