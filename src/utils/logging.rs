use std::panic;

use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};
use tracing_subscriber::prelude::*;

pub fn init() {
    let fmt_layer = fmt::layer().with_target(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Route panics through tracing. With `fail_fast` the process exits after
/// logging; otherwise the panicking request is answered by the router's
/// panic layer and the server keeps running.
pub fn install_panic_hook(fail_fast: bool) {
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        error!(location = %location, "panic: {}", panic_message(info.payload()));

        if fail_fast {
            error!("fail-fast enabled, exiting");
            std::process::exit(1);
        }
    }));
}

pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
