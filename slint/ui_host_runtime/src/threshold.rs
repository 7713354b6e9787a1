pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const THRESHOLD_MIN: f64 = 0.0;
pub const THRESHOLD_MAX: f64 = 1.0;

/// Canonical confidence threshold mirrored into a slider and a text field.
///
/// The slider always shows `value`. The text field shows `input_text`, which
/// only diverges from the formatted value while the user is editing it.
#[derive(Debug, Clone)]
pub struct ThresholdSync {
    value: f64,
    input_text: String,
    user_editing: bool,
}

impl Default for ThresholdSync {
    fn default() -> Self {
        Self {
            value: DEFAULT_THRESHOLD,
            input_text: format_threshold(DEFAULT_THRESHOLD),
            user_editing: false,
        }
    }
}

impl ThresholdSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn is_user_editing(&self) -> bool {
        self.user_editing
    }

    pub fn set_user_editing(&mut self, editing: bool) {
        self.user_editing = editing;
    }

    /// Position of the value along the slider track, in percent.
    pub fn percent(&self) -> f64 {
        (self.value - THRESHOLD_MIN) / (THRESHOLD_MAX - THRESHOLD_MIN) * 100.0
    }

    /// Slider moved. Returns the value to broadcast.
    pub fn on_continuous_input(&mut self, raw: f64) -> f64 {
        self.value = if raw.is_finite() {
            raw.clamp(THRESHOLD_MIN, THRESHOLD_MAX)
        } else {
            DEFAULT_THRESHOLD
        };

        if !self.user_editing {
            self.input_text = format_threshold(self.value);
        }

        self.value
    }

    /// Text field changed by a keystroke. The raw text is kept as typed while
    /// the slider snaps to the sanitized value.
    pub fn on_discrete_input(&mut self, raw: &str) -> f64 {
        self.user_editing = true;
        self.input_text = raw.to_string();
        self.on_continuous_input(sanitize_threshold(raw))
    }

    /// Text field lost focus: commit the text as a two-decimal value.
    pub fn on_discrete_blur(&mut self) -> f64 {
        self.user_editing = false;
        let value = sanitize_threshold(&self.input_text);
        self.input_text = format_threshold(value);
        self.on_continuous_input(value)
    }

    /// Reset overrides any in-progress edit so the text field shows the
    /// default along with the slider.
    pub fn on_reset(&mut self) -> f64 {
        self.user_editing = false;
        self.input_text = format_threshold(DEFAULT_THRESHOLD);
        self.on_continuous_input(DEFAULT_THRESHOLD)
    }
}

pub fn format_threshold(value: f64) -> String {
    format!("{value:.2}")
}

/// Parse user text into a threshold: unparsable text becomes the default and
/// anything outside `[0, 1]` is clamped.
pub fn sanitize_threshold(raw: &str) -> f64 {
    match parse_float_prefix(raw) {
        Some(value) if !value.is_nan() => value.clamp(THRESHOLD_MIN, THRESHOLD_MAX),
        _ => DEFAULT_THRESHOLD,
    }
}

/// Longest leading decimal literal of `raw`, after leading whitespace.
/// Trailing garbage is ignored, so `"0.7abc"` yields `0.7`.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let rest = &text[end..];
    if rest.starts_with("Infinity") {
        let negative = text.starts_with('-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse::<f64>().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_default() {
        let threshold = ThresholdSync::new();
        assert_eq!(threshold.value(), 0.5);
        assert_eq!(threshold.input_text(), "0.50");
        assert_eq!(threshold.percent(), 50.0);
    }

    #[test]
    fn sanitize_clamps_and_defaults() {
        assert_eq!(sanitize_threshold("-1"), 0.0);
        assert_eq!(sanitize_threshold("abc"), 0.5);
        assert_eq!(sanitize_threshold(""), 0.5);
        assert_eq!(sanitize_threshold("2.5"), 1.0);
        assert_eq!(sanitize_threshold("0.73"), 0.73);
    }

    #[test]
    fn parse_follows_leading_prefix() {
        assert_eq!(parse_float_prefix("0.7abc"), Some(0.7));
        assert_eq!(parse_float_prefix("  .5"), Some(0.5));
        assert_eq!(parse_float_prefix("1."), Some(1.0));
        assert_eq!(parse_float_prefix("1e-1"), Some(0.1));
        assert_eq!(parse_float_prefix("3e"), Some(3.0));
        assert_eq!(parse_float_prefix("-0.25"), Some(-0.25));
        assert_eq!(parse_float_prefix("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("nan"), None);
        assert_eq!(parse_float_prefix("inf"), None);
    }

    #[test]
    fn slider_input_updates_text_when_not_editing() {
        let mut threshold = ThresholdSync::new();
        let sent = threshold.on_continuous_input(0.8);

        assert_eq!(sent, 0.8);
        assert_eq!(threshold.input_text(), "0.80");
        assert!((threshold.percent() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn slider_input_leaves_text_alone_while_editing() {
        let mut threshold = ThresholdSync::new();
        threshold.set_user_editing(true);
        threshold.on_discrete_input("0.");
        threshold.on_continuous_input(0.3);

        assert_eq!(threshold.value(), 0.3);
        assert_eq!(threshold.input_text(), "0.");
    }

    #[test]
    fn keystroke_snaps_value_but_keeps_raw_text() {
        let mut threshold = ThresholdSync::new();
        threshold.set_user_editing(true);

        assert_eq!(threshold.on_discrete_input("2.5"), 1.0);
        assert_eq!(threshold.value(), 1.0);
        assert_eq!(threshold.input_text(), "2.5");

        assert_eq!(threshold.on_discrete_input("-1"), 0.0);
        assert_eq!(threshold.on_discrete_input("abc"), 0.5);
    }

    #[test]
    fn blur_commits_two_decimals() {
        let cases = [
            ("-1", "0.00"),
            ("abc", "0.50"),
            ("", "0.50"),
            ("2.5", "1.00"),
            ("0.5", "0.50"),
            ("0.123", "0.12"),
        ];

        for (typed, committed) in cases {
            let mut threshold = ThresholdSync::new();
            threshold.set_user_editing(true);
            threshold.on_discrete_input(typed);
            threshold.on_discrete_blur();

            assert_eq!(threshold.input_text(), committed, "typed {typed:?}");
            assert!(!threshold.is_user_editing());
            assert!((0.0..=1.0).contains(&threshold.value()));
        }
    }

    #[test]
    fn reset_restores_default_from_any_state() {
        let mut threshold = ThresholdSync::new();
        threshold.set_user_editing(true);
        threshold.on_discrete_input("0.9");

        assert_eq!(threshold.on_reset(), 0.5);
        assert_eq!(threshold.value(), 0.5);
        assert_eq!(threshold.input_text(), "0.50");
        assert!(!threshold.is_user_editing());
    }

    #[test]
    fn keystroke_after_reset_is_not_overwritten_by_slider() {
        let mut threshold = ThresholdSync::new();
        threshold.on_reset();
        threshold.on_discrete_input("0.");
        threshold.on_continuous_input(0.4);

        assert!(threshold.is_user_editing());
        assert_eq!(threshold.input_text(), "0.");
    }

    #[test]
    fn non_finite_slider_value_falls_back_to_default() {
        let mut threshold = ThresholdSync::new();
        assert_eq!(threshold.on_continuous_input(f64::NAN), 0.5);
    }
}
