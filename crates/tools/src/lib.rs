//! mtx Tools
//!
//! Command line support for the mtx runtime: logging setup and the JSON
//! program format read by `mtx-run`.

pub mod error;
pub mod program;

pub use error::ToolError;
pub use program::{Program, ProgramReport};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info`, with `debug` for the runtime and the tools.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mtx_tools=debug,mtx_runtime=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}
