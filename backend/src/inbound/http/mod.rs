//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod archive;
pub mod auth;
pub mod directory;
pub mod error;
pub mod feeds;
pub mod health;
pub mod hooks;
pub mod reports;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod settings;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// Callers wrap the scope with the session middleware.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PayloadConfig::new(settings::AVATAR_MAX_BYTES))
        .service(auth::login)
        .service(auth::logout)
        .service(auth::current_session)
        .service(auth::sign_up)
        .service(auth::forgot_password)
        .service(auth::reset_password)
        .service(feeds::list_notifications)
        .service(feeds::mark_notification_read)
        .service(feeds::delete_notification)
        .service(feeds::list_emails)
        .service(feeds::mark_email_read)
        .service(feeds::delete_email)
        .service(directory::list_doctors)
        .service(directory::create_doctor)
        .service(directory::update_doctor)
        .service(directory::list_patients)
        .service(directory::create_patient)
        .service(directory::update_patient)
        .service(directory::patient_logs)
        .service(archive::list_archived)
        .service(archive::archive_record)
        .service(archive::restore_record)
        .service(reports::dashboard)
        .service(reports::list_reports)
        .service(reports::create_report)
        .service(reports::update_report_status)
        .service(settings::get_profile)
        .service(settings::update_profile)
        .service(settings::upload_avatar)
        .service(hooks::receive_change);
}
