pub mod fake_gftp;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

pub use fake_gftp::FakeGftp;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Accept a fake binary with default options.
pub async fn accept(binary: &std::path::Path) -> anyhow::Result<gftpwrap::api::Gftp> {
    let gftp = gftpwrap::api::Gftp::new(binary, gftpwrap::GftpOptions::default()).await?;
    Ok(gftp)
}
