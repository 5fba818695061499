//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **gateway**: reqwest-backed REST and storage client for the hosted
//!   backend
//! - **realtime**: in-process fan-out of row inserts relayed by the
//!   backend's database webhook
//! - **memory**: process-local backend for development mode and tests
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod gateway;
pub mod memory;
pub mod realtime;
