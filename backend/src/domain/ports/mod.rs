//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`AvatarStorage`], [`ChangeStream`],
//! [`ChangeSink`]) are implemented by outbound adapters. Driving ports
//! (`*Query`, `*Command`, [`LoginService`]) are implemented by domain
//! services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod archive_command;
mod archive_query;
mod archive_repository;
mod avatar_storage;
mod change_stream;
mod directory_command;
mod directory_query;
mod directory_repository;
mod feed_command;
mod feed_query;
mod feed_repository;
mod login_service;
mod profile_command;
mod profile_query;
mod report_repository;
mod reports_command;
mod reports_query;
mod user_repository;

pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use archive_command::ArchiveCommand;
#[cfg(test)]
pub use archive_command::MockArchiveCommand;
#[cfg(test)]
pub use archive_query::MockArchiveQuery;
pub use archive_query::{ArchiveQuery, ArchivedRecords};
#[cfg(test)]
pub use archive_repository::MockArchiveRepository;
pub use archive_repository::{ArchiveRepository, ArchiveRepositoryError};
#[cfg(test)]
pub use avatar_storage::MockAvatarStorage;
pub use avatar_storage::{AvatarStorage, AvatarStorageError};
#[cfg(test)]
pub use change_stream::{MockChangeSink, MockChangeStream};
pub use change_stream::{ChangeSink, ChangeSinkError, ChangeStream, Subscription};
pub use directory_command::DirectoryCommand;
#[cfg(test)]
pub use directory_command::MockDirectoryCommand;
pub use directory_query::DirectoryQuery;
#[cfg(test)]
pub use directory_query::MockDirectoryQuery;
#[cfg(test)]
pub use directory_repository::MockDirectoryRepository;
pub use directory_repository::{DirectoryRepository, DirectoryRepositoryError, PatientLogKind};
pub use feed_command::FeedCommand;
#[cfg(test)]
pub use feed_command::MockFeedCommand;
pub use feed_query::FeedQuery;
#[cfg(test)]
pub use feed_query::MockFeedQuery;
pub use feed_repository::{EmailRepository, FeedRepositoryError, NotificationRepository};
#[cfg(test)]
pub use feed_repository::{MockEmailRepository, MockNotificationRepository};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use profile_command::MockProfileCommand;
pub use profile_command::ProfileCommand;
#[cfg(test)]
pub use profile_query::MockProfileQuery;
pub use profile_query::ProfileQuery;
#[cfg(test)]
pub use report_repository::MockReportRepository;
pub use report_repository::{ReportRepository, ReportRepositoryError};
#[cfg(test)]
pub use reports_command::MockReportsCommand;
pub use reports_command::ReportsCommand;
#[cfg(test)]
pub use reports_query::MockReportsQuery;
pub use reports_query::ReportsQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    AccountUpdate, NewAccount, StoredAccount, UserPersistenceError, UserRepository,
};
