//! Backend for the clinic administration console.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the rules and the
//! ports, [`inbound`] exposes them over HTTP and WebSocket, and [`outbound`]
//! implements the ports against the hosted gateway or process memory.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
