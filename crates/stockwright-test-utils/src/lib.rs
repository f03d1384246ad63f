//! Shared test utilities for stockwright integration tests.
//!
//! Provides an in-memory stand-in for the persistence service and two ways
//! to reach it:
//! - [`FakeGateway`]: implements `Gateway` directly, records every call in
//!   issue order, tracks how many calls overlap, and can be told to fail a
//!   specific call.
//! - [`spawn_stub_server`]: serves the same backend over real HTTP so the
//!   `reqwest` gateway can be exercised end to end.

mod backend;
mod fake;
mod server;

pub use backend::InMemoryBackend;
pub use fake::{Call, CallKind, FakeGateway};
pub use server::{StubServer, spawn_stub_server};

use rust_decimal::Decimal;

/// Shorthand for whole-number decimals in fixtures.
pub fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}
