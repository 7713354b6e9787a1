pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod presence;
pub mod protocol;
pub mod render;
pub mod threshold;
pub mod transport;

use crate::config::MonitorConfig;
use crate::controller::{Command, MonitorController};
use crate::presence::{RandomPhrases, TimerHandle};
use crate::protocol::ready_envelope;
use crate::render::{BannerView, FeedbackView, HistoryView, MonitorView, ThresholdView};
use crate::transport::{
    LinkWriter, OutboundQueue, TransportEvent, connector_for, run_link, writer_loop,
};
use slint::ComponentHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{error, info, warn};

pub use crate::error::{ConfigError, DecodeError, RuntimeError};

/// Glue between the runtime and a concrete window. Setters receive fully
/// rendered view structs; handlers are invoked on the UI thread.
pub trait HostBindings: 'static {
    type Ui: ComponentHandle + 'static;

    fn new_ui() -> Result<Self::Ui, slint::PlatformError>;

    fn bind_slider_moved<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(f64) + Send + 'static;

    fn bind_threshold_edited<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(String) + Send + 'static;

    fn bind_threshold_focus<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(bool) + Send + 'static;

    fn bind_threshold_reset<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn() + Send + 'static;

    fn set_history(ui: &Self::Ui, history: &HistoryView);
    fn set_feedback(ui: &Self::Ui, feedback: &FeedbackView);
    fn set_threshold(ui: &Self::Ui, threshold: &ThresholdView);
    fn set_banner(ui: &Self::Ui, banner: &BannerView);
}

/// State shared by UI callbacks, the link thread and revert timers.
#[derive(Debug, Clone)]
struct Session {
    controller: Arc<Mutex<MonitorController>>,
    outbound: OutboundQueue,
}

pub fn run<B: HostBindings>() -> Result<(), RuntimeError> {
    let config = MonitorConfig::from_env()?;
    info!(?config, "starting face monitor");

    let ui = B::new_ui()?;
    let ui_weak = ui.as_weak();
    let (outbound, rx) = OutboundQueue::bounded(config.outbound_queue_cap);
    let session = Session {
        controller: Arc::new(Mutex::new(MonitorController::new(Box::new(
            RandomPhrases::from_os_rng(),
        )))),
        outbound,
    };
    let shutdown = Arc::new(AtomicBool::new(false));
    let link = LinkWriter::default();

    install_callbacks::<B>(&ui, &session);
    if let Ok(controller) = session.controller.lock() {
        apply_view::<B>(&ui, &controller.view());
    }

    let writer_link = link.clone();
    let writer_handle = thread::spawn(move || writer_loop(rx, writer_link));

    let link_session = session.clone();
    let link_shutdown = shutdown.clone();
    let link_handle = thread::spawn(move || {
        let mut connector = connector_for(&config.transport);
        let hello = ready_envelope(config.sid.clone());

        run_link(
            connector.as_mut(),
            &link,
            &hello,
            config.reconnect_delay,
            &link_shutdown,
            |event| {
                let session = link_session.clone();
                let event_weak = ui_weak.clone();
                let posted = ui_weak.upgrade_in_event_loop(move |ui| {
                    handle_transport_event::<B>(&ui, &event_weak, &session, event);
                });
                if let Err(err) = posted {
                    warn!(%err, "failed to post transport event to UI thread");
                }
            },
        );

        info!("backend link closed for good");
    });

    ui.run()?;
    shutdown.store(true, Ordering::Release);

    // Drop UI first so callback closures release their queue clones.
    drop(ui);
    drop(session);

    if link_handle.is_finished() {
        if let Err(err) = link_handle.join() {
            error!(?err, "link thread panicked");
        }
    } else {
        // A blocked read would hang process exit; the thread dies with us.
        warn!("link thread still active during shutdown; skipping join");
    }

    if writer_handle.is_finished() {
        if let Err(err) = writer_handle.join() {
            error!(?err, "writer thread panicked");
        }
    } else {
        warn!("writer thread still active during shutdown; skipping join");
    }

    Ok(())
}

fn install_callbacks<B: HostBindings>(ui: &B::Ui, session: &Session) {
    let slider_session = session.clone();
    let slider_ui = ui.as_weak();
    B::bind_slider_moved(ui, move |value| {
        update::<B>(&slider_ui, &slider_session, |controller| {
            controller.on_slider_moved(value)
        });
    });

    let edit_session = session.clone();
    let edit_ui = ui.as_weak();
    B::bind_threshold_edited(ui, move |text| {
        update::<B>(&edit_ui, &edit_session, |controller| {
            controller.on_threshold_edited(&text)
        });
    });

    let focus_session = session.clone();
    let focus_ui = ui.as_weak();
    B::bind_threshold_focus(ui, move |focused| {
        update::<B>(&focus_ui, &focus_session, |controller| {
            controller.on_threshold_focus(focused)
        });
    });

    let reset_session = session.clone();
    let reset_ui = ui.as_weak();
    B::bind_threshold_reset(ui, move || {
        update::<B>(&reset_ui, &reset_session, MonitorController::on_threshold_reset);
    });
}

fn handle_transport_event<B: HostBindings>(
    ui: &B::Ui,
    ui_weak: &slint::Weak<B::Ui>,
    session: &Session,
    event: TransportEvent,
) {
    let commands = {
        let Ok(mut controller) = session.controller.lock() else {
            error!("failed to lock monitor state for transport event");
            return;
        };
        let commands = controller.handle_transport(event);
        apply_view::<B>(ui, &controller.view());
        commands
    };

    execute::<B>(ui_weak, session, commands);
}

/// Runs one UI handler against the controller, re-renders, then carries out
/// the returned commands.
fn update<B: HostBindings>(
    ui_weak: &slint::Weak<B::Ui>,
    session: &Session,
    handler: impl FnOnce(&mut MonitorController) -> Vec<Command>,
) {
    let Some(ui) = ui_weak.upgrade() else {
        return;
    };

    let commands = {
        let Ok(mut controller) = session.controller.lock() else {
            error!("failed to lock monitor state for UI event");
            return;
        };
        let commands = handler(&mut controller);
        apply_view::<B>(&ui, &controller.view());
        commands
    };

    execute::<B>(ui_weak, session, commands);
}

fn execute<B: HostBindings>(
    ui_weak: &slint::Weak<B::Ui>,
    session: &Session,
    commands: Vec<Command>,
) {
    for command in commands {
        match command {
            Command::Emit(envelope) => {
                session.outbound.send(envelope);
            }
            Command::ArmRevertTimer { handle, after } => {
                let ui_weak = ui_weak.clone();
                let session = session.clone();
                slint::Timer::single_shot(after, move || {
                    on_revert_timer::<B>(&ui_weak, &session, handle);
                });
            }
        }
    }
}

fn on_revert_timer<B: HostBindings>(
    ui_weak: &slint::Weak<B::Ui>,
    session: &Session,
    handle: TimerHandle,
) {
    let Ok(mut controller) = session.controller.lock() else {
        error!("failed to lock monitor state for revert timer");
        return;
    };

    if controller.on_revert_timer(handle) {
        if let Some(ui) = ui_weak.upgrade() {
            apply_view::<B>(&ui, &controller.view());
        }
    }
}

fn apply_view<B: HostBindings>(ui: &B::Ui, view: &MonitorView) {
    B::set_history(ui, &view.history);
    B::set_feedback(ui, &view.feedback);
    B::set_threshold(ui, &view.threshold);
    B::set_banner(ui, &view.banner);
}
