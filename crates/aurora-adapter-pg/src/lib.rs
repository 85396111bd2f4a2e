//! Postgres driver for the Aurora interception engine.
//!
//! [`PgDriver`] implements the engine's [`aurora_core::Driver`] contract on
//! top of `sqlx`, one physical connection per open. [`PgConnectionProvider`]
//! decides which protocols and hosts that driver serves.

pub mod driver;
pub mod error;
pub mod provider;

pub use driver::{PgDriver, PgDriverConnection, returns_rows};
pub use error::ProviderError;
pub use provider::{PgConnectionProvider, TARGET_NAME};
