use crate::opts::ShellOptions;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initializes the tracing subscriber, logging to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn subscriber(shell: ShellOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(shell.default_filter()));
    FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Enables colored output when the terminal supports it.
pub fn enable_paint() {
    let enable = yansi::Condition::os_support() && yansi::Condition::tty_and_color_live();
    yansi::whenever(yansi::Condition::cached(enable));
}
