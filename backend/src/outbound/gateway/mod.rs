//! Adapters for the hosted backend gateway.
//!
//! One [`RestGateway`] client is shared by every adapter. Each adapter
//! implements one driven port and owns the table names and row shapes it
//! needs; failures are mapped into the port's error type at the boundary.

mod client;
mod errors;
mod feeds;
mod records;
mod rows;
mod storage;
mod users;

pub use client::{GatewayError, RestGateway};
pub use feeds::{EMAIL_TABLE, GatewayEmailRepository, GatewayNotificationRepository};
pub use records::{GatewayArchiveRepository, GatewayDirectoryRepository, GatewayReportRepository};
pub use storage::GatewayAvatarStorage;
pub use users::GatewayUserRepository;

pub(crate) use rows::decode_change_record;
