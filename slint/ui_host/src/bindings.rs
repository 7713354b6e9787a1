use crate::{AppWindow, DetectionRow};
use face_monitor_runtime::HostBindings;
use face_monitor_runtime::render::{BannerView, FeedbackView, HistoryView, ThresholdView};
use slint::{ModelRc, SharedString, VecModel};

pub struct AppBindings;

impl HostBindings for AppBindings {
    type Ui = AppWindow;

    fn new_ui() -> Result<Self::Ui, slint::PlatformError> {
        AppWindow::new()
    }

    fn bind_slider_moved<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(f64) + Send + 'static,
    {
        ui.on_threshold_slider_moved(move |value| handler(f64::from(value)));
    }

    fn bind_threshold_edited<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(String) + Send + 'static,
    {
        ui.on_threshold_edited(move |text| handler(text.to_string()));
    }

    fn bind_threshold_focus<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(bool) + Send + 'static,
    {
        ui.on_threshold_focus_changed(move |focused| handler(focused));
    }

    fn bind_threshold_reset<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn() + Send + 'static,
    {
        ui.on_threshold_reset(move || handler());
    }

    fn set_history(ui: &Self::Ui, history: &HistoryView) {
        match history {
            HistoryView::Placeholder(text) => {
                ui.set_history_placeholder(SharedString::from(*text));
                ui.set_detections(ModelRc::default());
            }
            HistoryView::Rows(rows) => {
                let rows: Vec<DetectionRow> = rows
                    .iter()
                    .map(|row| DetectionRow {
                        summary: row.summary.as_str().into(),
                        time: row.time.as_str().into(),
                    })
                    .collect();
                ui.set_history_placeholder(SharedString::default());
                ui.set_detections(ModelRc::new(VecModel::from(rows)));
            }
        }
    }

    fn set_feedback(ui: &Self::Ui, feedback: &FeedbackView) {
        ui.set_feedback_active(feedback.active);
        ui.set_feedback_text(feedback.text.as_str().into());
    }

    fn set_threshold(ui: &Self::Ui, threshold: &ThresholdView) {
        ui.set_threshold_value(threshold.value as f32);
        ui.set_threshold_label(threshold.label.as_str().into());
        ui.set_threshold_percent(threshold.percent as f32);
        if let Some(text) = &threshold.input_text {
            ui.set_threshold_text(text.as_str().into());
        }
    }

    fn set_banner(ui: &Self::Ui, banner: &BannerView) {
        ui.set_banner_visible(banner.visible);
        ui.set_banner_text(banner.text.as_str().into());
    }
}
