use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
};

/// Filter used when `RUST_LOG` is unset, by number of `-v` flags.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "info,turntable_ct_rs=debug",
        _ => "debug,turntable_ct_rs=trace",
    }
}

/// Installs the global subscriber at the default `info` level.
pub fn init() {
    init_with_verbosity(0);
}

/// Installs the global subscriber. `RUST_LOG` overrides `verbosity`.
///
/// Stage span timings are printed on close whenever the active filter
/// mentions `debug` or `trace`. A second call is a no-op.
pub fn init_with_verbosity(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let filter_text = env_filter.to_string();
    let show_spans = filter_text.contains("debug") || filter_text.contains("trace");

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(if show_spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
