//! Test Utilities Crate
//!
//! Provides shared test infrastructure for the ERP gateway test suite.
//!
//! # Modules
//!
//! - `mock`: scriptable in-memory ERP transport and factory
//! - `fixtures`: connection settings and raw ERP rows
//! - `assertions`: assertion helpers over recorded ERP calls
//! - `generators`: property-based test data generators
//! - `logs`: in-memory capture of emitted log lines

pub mod mock;
pub mod fixtures;
pub mod assertions;
pub mod generators;
pub mod logs;

pub use mock::*;
pub use fixtures::*;
pub use assertions::*;
pub use generators::*;
pub use logs::*;

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_env("TEST_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Installs a test-friendly tracing subscriber once per process
///
/// Output is off unless `TEST_LOG` holds a filter such as `infra_erp=debug`.
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
