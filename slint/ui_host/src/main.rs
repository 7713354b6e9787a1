mod bindings;

use std::process;
use tracing::error;

slint::include_modules!();

fn main() {
    // stdout carries the stdio transport, so logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if let Err(err) = face_monitor_runtime::run::<bindings::AppBindings>() {
        error!("face monitor fatal error: {err}");
        process::exit(1);
    }
}
