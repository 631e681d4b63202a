//! Core of the rftp batch FTP client: path composition, the recursive
//! transfer/removal engine and the command dispatcher, written against the
//! [`remote::RemoteFs`] capability so the protocol session stays swappable.

pub mod dispatch;
pub mod download;
pub mod path;
pub mod progress;
pub mod remote;
pub mod remove;
pub mod transfer;
pub mod upload;

#[cfg(test)]
pub mod testutils;

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
}

impl OutputConfig {
    fn level(&self) -> &'static str {
        if self.quiet {
            return "off";
        }
        match self.verbose {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Install the global tracing subscriber. Diagnostics go to stderr so they
/// never mix with listing output on stdout; `RUST_LOG` overrides the
/// verbosity flags.
pub fn init_tracing(output: &OutputConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(output.level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
