//! Domain primitives, aggregates and services.
//!
//! Purpose: hold the console's rules independent of HTTP and of the hosted
//! backend. Types validate on construction and document their serialisation
//! contracts; services implement the driving ports in [`ports`] over the
//! driven ports implemented by outbound adapters.
//!
//! Public surface:
//! - [`Error`] and [`ErrorCode`]: API error payload and stable identifier.
//! - Credential manager: [`hash_password`], [`verify_password`],
//!   [`generate_temporary_password`].
//! - Feeds: [`NotificationFeed`], [`EmailFeed`], [`FeedSession`].
//! - Session context: [`AdminSession`].
//! - Services: [`AuthService`], [`FeedService`], [`DirectoryService`],
//!   [`ArchiveService`], [`ReportsService`], [`SettingsService`],
//!   [`CredentialMigrationService`].

pub mod error;
pub mod notifications;
pub mod ports;
pub mod trace_id;

mod archive_service;
mod auth;
mod auth_service;
mod credential_migration;
mod credentials;
mod directory;
mod directory_service;
#[cfg(test)]
pub(crate) mod fixture_clock;
mod reports;
mod reports_service;
mod session;
mod settings;
mod settings_service;
mod user;

pub use self::archive_service::ArchiveService;
pub use self::auth::{
    LoginCredentials, LoginValidationError, PasswordChangeError, SignUpParts, SignUpRequest,
    SignUpValidationError, confirmed_password,
};
pub use self::auth_service::{AuthService, INVALID_CREDENTIALS};
pub use self::credential_migration::{
    CredentialMigrationService, MigrationMode, MigrationSummary,
};
pub use self::credentials::{
    CredentialError, HASH_COST, KNOWN_HASH_PREFIXES, Password, PasswordAlphabet, PasswordHash,
    StoredCredential, TEMPORARY_PASSWORD_LENGTH, Verification, generate_temporary_password,
    generate_temporary_password_with, hash_password, verify_password,
};
pub use self::directory::{
    AddressParts, Doctor, DoctorDraft, DoctorDraftValidationError, DoctorForm, DoctorProfile,
    GeneratedCredentials, NewDoctor, NewPatient, PLACEHOLDER_EMAIL_DOMAIN, Patient, PatientDraft,
    PatientDraftValidationError, PatientForm, PatientLogs, PatientProfile, PersonName,
    ProvisionedDoctor, ProvisionedPatient, RecordKind, UnknownRecordKind,
};
pub use self::directory_service::DirectoryService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::notifications::{
    ChangeEvent, EmailFeed, EmailMessage, Feed, FeedAction, FeedEntry, FeedService, FeedSession,
    FeedUpdate, InsertOutcome, NotificationFeed, NotificationItem, NotificationKey,
    NotificationSource, PatientNotification, ReportNotification, UnknownNotificationSource,
};
pub use self::reports::{
    DashboardStats, NewReport, RECENT_PENDING_LIMIT, Report, ReportDraft, ReportFilter,
    ReportStatus, ReportValidationError, UnknownReportStatus, patients_per_month,
};
pub use self::reports_service::ReportsService;
pub use self::session::AdminSession;
pub use self::settings::{
    AVATAR_BUCKET, AVATAR_PROBE_EXTENSIONS, AdminProfile, AvatarFormat, ProfileForm,
    ProfileUpdate, SettingsValidationError, avatar_path,
};
pub use self::settings_service::SettingsService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DEFAULT_DISPLAY_NAME, Email, Role, UserAccount, UserId, UserValidationError,
    username_from_name,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use clinic_console::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
