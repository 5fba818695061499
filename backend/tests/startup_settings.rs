//! Startup configuration: `CLINIC_*` variables through to session cookies.

use std::ffi::OsString;
use std::io::Write;

use actix_web::cookie::SameSite;
use clinic_console::inbound::http::session_config::fingerprint::key_fingerprint;
use clinic_console::inbound::http::session_config::{
    BuildMode, SessionConfigError, session_settings,
};
use clinic_console::settings::ConsoleSettings;
use env_lock::lock_env;
use ortho_config::OrthoConfig;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

const VARS: [&str; 6] = [
    "CLINIC_SESSION_KEY_FILE",
    "CLINIC_COOKIE_SECURE",
    "CLINIC_SAME_SITE",
    "CLINIC_ALLOW_EPHEMERAL_SESSION_KEY",
    "CLINIC_GATEWAY_URL",
    "CLINIC_ALLOWED_ORIGINS",
];

#[fixture]
fn key_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp key file");
    file.write_all(&[b'k'; 64]).expect("write key");
    file
}

fn environment(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
    VARS.iter()
        .map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| (*value).to_owned());
            (*name, value)
        })
        .collect()
}

fn load() -> ConsoleSettings {
    ConsoleSettings::load_from_iter([OsString::from("clinic-console")]).expect("settings load")
}

#[rstest]
fn release_settings_from_environment_build_session_cookies(key_file: NamedTempFile) {
    let path = key_file.path().to_string_lossy().into_owned();
    let _guard = lock_env(environment(&[
        ("CLINIC_SESSION_KEY_FILE", &path),
        ("CLINIC_COOKIE_SECURE", "true"),
        ("CLINIC_SAME_SITE", "Strict"),
        ("CLINIC_ALLOW_EPHEMERAL_SESSION_KEY", "false"),
    ]));

    let settings = load();
    let session = session_settings(&settings, BuildMode::Release).expect("valid settings");
    assert!(session.cookie_secure);
    assert_eq!(session.same_site, SameSite::Strict);

    let again = session_settings(&settings, BuildMode::Release).expect("valid settings");
    assert_eq!(key_fingerprint(&session.key), key_fingerprint(&again.key));
}

#[rstest]
fn release_without_toggles_names_the_missing_variable() {
    let _guard = lock_env(environment(&[]));
    let settings = load();
    let Err(error) = session_settings(&settings, BuildMode::Release) else {
        panic!("release builds require explicit toggles");
    };
    assert!(matches!(
        error,
        SessionConfigError::MissingSetting {
            name: "CLINIC_COOKIE_SECURE"
        }
    ));
}

#[rstest]
fn debug_without_key_file_still_starts() {
    let _guard = lock_env(environment(&[(
        "CLINIC_SESSION_KEY_FILE",
        "/nonexistent/clinic/session_key",
    )]));
    let settings = load();
    let session = session_settings(&settings, BuildMode::Debug).expect("debug tolerates defaults");
    assert!(session.cookie_secure);
    assert_eq!(session.same_site, SameSite::Lax);
    assert!(settings.gateway_url().is_none());
}

#[rstest]
fn origins_from_environment_feed_the_socket_allow_list() {
    let _guard = lock_env(environment(&[(
        "CLINIC_ALLOWED_ORIGINS",
        "https://console.clinic.example,,http://localhost:5173",
    )]));
    let origins = load().allowed_origins().expect("origins parse");
    let hosts: Vec<_> = origins.iter().filter_map(|url| url.host_str()).collect();
    assert_eq!(hosts, ["console.clinic.example", "localhost"]);
}
