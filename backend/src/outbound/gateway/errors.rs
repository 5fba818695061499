//! Conversions from gateway failures into driven-port errors.

use tracing::debug;

use super::client::GatewayError;
use crate::domain::ports::{
    ArchiveRepositoryError, AvatarStorageError, DirectoryRepositoryError, FeedRepositoryError,
    ReportRepositoryError, UserPersistenceError,
};

/// Implement `From<GatewayError>` for port errors with `Connection` and
/// `Query` variants: outages become connection failures, everything else
/// a query failure.
macro_rules! impl_from_gateway_error {
    ($($port:ty),* $(,)?) => {
        $(
            impl From<GatewayError> for $port {
                fn from(error: GatewayError) -> Self {
                    debug!(%error, port = stringify!($port), "gateway call failed");
                    if error.is_connection() {
                        Self::connection(error.to_string())
                    } else {
                        Self::query(error.to_string())
                    }
                }
            }
        )*
    };
}

impl_from_gateway_error!(
    UserPersistenceError,
    FeedRepositoryError,
    DirectoryRepositoryError,
    ArchiveRepositoryError,
    ReportRepositoryError,
);

impl From<GatewayError> for AvatarStorageError {
    fn from(error: GatewayError) -> Self {
        debug!(%error, "storage call failed");
        if error.is_connection() {
            Self::connection(error.to_string())
        } else {
            Self::rejected(error.to_string())
        }
    }
}
