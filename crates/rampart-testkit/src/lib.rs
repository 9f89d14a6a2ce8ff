//! Rampart Testing Infrastructure
//!
//! Shared fixtures for exercising the permission compiler without a real
//! storage layer.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rampart-testkit = { path = "../rampart-testkit" }
//! ```
//!
//! ```rust,ignore
//! use rampart_testkit::*;
//!
//! #[tokio::test]
//! async fn builds_index() {
//!     let fixture = AccountFixture::new("acct").with_environment("app", "prod", EnvironmentType::Prod);
//!     let engine = fixture.engine(groups, EngineConfig::default());
//!     let index = engine.build(&fixture.account, &groups).await.unwrap();
//! }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod builders;
pub mod fixtures;
pub mod mocks;
pub mod strategies;

pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a `RUST_LOG`-driven fmt subscriber once per test binary
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
