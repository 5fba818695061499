//! Inbound adapters translating HTTP requests and feed socket frames into
//! domain service calls.
//!
//! [`http`] carries the REST surface and the gateway webhook; [`ws`] carries
//! the live notification and inbox feed.

pub mod http;
pub mod ws;
