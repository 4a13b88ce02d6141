//! Error reporting for the `charity` binary.

use eyre::EyreHandler;
use itertools::Itertools;
use std::{error::Error, fmt, panic::Location};

/// Environment variable that switches to the verbose `color-eyre` report.
pub const DEBUG_ENV: &str = "CHARITY_DEBUG";

/// Reports an error as its cause chain, each message once.
///
/// `{}` joins the chain on one line, `{:?}` (what `main` prints on failure) puts every cause
/// on its own line below the error.
#[derive(Default)]
pub struct Handler {
    verbose: Option<Box<dyn EyreHandler>>,
}

impl Handler {
    /// A handler that hands `Debug` output to `verbose`.
    pub fn verbose(verbose: Box<dyn EyreHandler>) -> Self {
        Self { verbose: Some(verbose) }
    }
}

/// Messages of `err` and its sources, skipping a cause whose text is already part of the
/// message before it.
pub fn dedup_chain(err: &(dyn Error + 'static)) -> Vec<String> {
    let mut causes: Vec<String> = std::iter::successors(Some(err), |err| (*err).source())
        .map(|cause| cause.to_string().trim().to_string())
        .collect();
    causes.dedup_by(|cause, previous| previous.contains(cause.as_str()));
    causes
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", dedup_chain(error).iter().format("; "))
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verbose {
            Some(verbose) => verbose.debug(error, f),
            None if f.alternate() => fmt::Debug::fmt(error, f),
            None => {
                let chain = dedup_chain(error);
                let mut chain = chain.iter();
                if let Some(error) = chain.next() {
                    f.write_str(error)?;
                }
                for (n, cause) in chain.enumerate() {
                    if n == 0 {
                        f.write_str("\n\nCaused by:")?;
                    }
                    write!(f, "\n  {n}: {cause}")?;
                }
                Ok(())
            }
        }
    }

    fn track_caller(&mut self, location: &'static Location<'static>) {
        if let Some(verbose) = &mut self.verbose {
            verbose.track_caller(location);
        }
    }
}

/// Installs the panic hook and the [`eyre`] hook.
///
/// Errors go through [`Handler`]; with `CHARITY_DEBUG` set they get the `color-eyre` report
/// with span traces instead.
pub fn install() {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("This is a bug in the charity client.")
        .into_hooks();
    panic_hook.install();

    let verbose_report = eyre_hook.into_eyre_hook();
    let verbose = std::env::var_os(DEBUG_ENV).is_some();
    let hook = eyre::set_hook(Box::new(move |err| {
        Box::new(if verbose { Handler::verbose(verbose_report(err)) } else { Handler::default() })
    }));
    if let Err(err) = hook {
        debug!(%err, "eyre hook already installed");
    }
}
