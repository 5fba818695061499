//! Tests for login, lazy credential migration and account flows.

use std::sync::{Arc, Mutex};

use rstest::rstest;

use super::*;
use crate::domain::fixture_clock::FixtureClock;
use crate::domain::ports::{MockUserRepository, StoredAccount};
use crate::domain::{ErrorCode, SignUpParts};

fn account(role: Role) -> UserAccount {
    UserAccount {
        id: UserId::new("7").expect("id"),
        username: Some("doc".into()),
        full_name: Some("Doc Holiday".into()),
        email: Email::new("doc@example.com").expect("email"),
        role,
        created_at: None,
    }
}

fn stored(role: Role, credential: &str) -> StoredAccount {
    StoredAccount {
        account: account(role),
        credential: StoredCredential::from_stored(credential),
    }
}

fn make_service(repo: MockUserRepository) -> AuthService<MockUserRepository> {
    AuthService::new(Arc::new(repo), Arc::new(FixtureClock::march_2024()))
}

fn login(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts(email, password).expect("credentials shape")
}

fn hashed(password: &str) -> String {
    hash_password(&Password::new(password)).expect("hash").into()
}

#[tokio::test]
async fn hashed_credential_logs_in_without_rewrite() {
    let hash = hashed("s3cret");
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email()
        .times(1)
        .return_once(move |_| Ok(Some(stored(Role::Admin, &hash))));
    repo.expect_update_password().never();

    let session = make_service(repo)
        .authenticate(&login("doc@example.com", "s3cret"))
        .await
        .expect("login succeeds");
    assert_eq!(session.user_id().as_ref(), "7");
    assert_eq!(session.role(), Role::Admin);
    assert_eq!(session.email().as_str(), "doc@example.com");
}

#[tokio::test]
async fn legacy_credential_is_rewritten_exactly_once() {
    // The row starts as plaintext "hunter2"; the rewrite replaces it with a
    // hash and the next login goes through bcrypt without writing again.
    let column = Arc::new(Mutex::new(String::from("hunter2")));
    let mut repo = MockUserRepository::new();
    let read = Arc::clone(&column);
    repo.expect_find_by_email().times(2).returning(move |_| {
        let value = read.lock().expect("column lock").clone();
        Ok(Some(stored(Role::Admin, &value)))
    });
    let write = Arc::clone(&column);
    repo.expect_update_password()
        .times(1)
        .returning(move |id, hash| {
            assert_eq!(id.as_ref(), "7");
            *write.lock().expect("column lock") = hash.as_str().to_owned();
            Ok(())
        });
    let service = make_service(repo);

    service
        .authenticate(&login("doc@example.com", "hunter2"))
        .await
        .expect("legacy login succeeds");
    let after = column.lock().expect("column lock").clone();
    assert_ne!(after, "hunter2");
    assert!(StoredCredential::from_stored(after).is_hashed());

    service
        .authenticate(&login("doc@example.com", "hunter2"))
        .await
        .expect("hashed login succeeds");
}

#[tokio::test]
async fn failed_rewrite_still_logs_in() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email()
        .return_once(|_| Ok(Some(stored(Role::Admin, "hunter2"))));
    repo.expect_update_password()
        .times(1)
        .return_once(|_, _| Err(UserPersistenceError::query("read only")));

    let result = make_service(repo)
        .authenticate(&login("doc@example.com", "hunter2"))
        .await;
    assert!(result.is_ok());
}

#[rstest]
#[case::unknown_email(None)]
#[case::wrong_legacy_password(Some("letmein"))]
#[case::malformed_hash(Some("$2b$garbage"))]
#[tokio::test]
async fn rejections_are_indistinguishable(#[case] credential: Option<&'static str>) {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email()
        .return_once(move |_| Ok(credential.map(|value| stored(Role::Admin, value))));
    repo.expect_update_password().never();

    let err = make_service(repo)
        .authenticate(&login("doc@example.com", "hunter2"))
        .await
        .expect_err("login rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), INVALID_CREDENTIALS);
}

#[tokio::test]
async fn wrong_password_against_hash_is_rejected() {
    let hash = hashed("right");
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email()
        .return_once(move |_| Ok(Some(stored(Role::Admin, &hash))));

    let err = make_service(repo)
        .authenticate(&login("doc@example.com", "wrong"))
        .await
        .expect_err("login rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[case(Role::Doctor)]
#[case(Role::Patient)]
#[tokio::test]
async fn non_admin_is_denied_distinctly(#[case] role: Role) {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email()
        .return_once(move |_| Ok(Some(stored(role, "hunter2"))));
    repo.expect_update_password().return_once(|_, _| Ok(()));

    let err = make_service(repo)
        .authenticate(&login("doc@example.com", "hunter2"))
        .await
        .expect_err("login denied");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn backend_outage_maps_to_service_unavailable() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email()
        .return_once(|_| Err(UserPersistenceError::connection("refused")));

    let err = make_service(repo)
        .authenticate(&login("doc@example.com", "x"))
        .await
        .expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

fn sign_up_request() -> SignUpRequest {
    SignUpRequest::try_from_parts(SignUpParts {
        full_name: "Ada Admin",
        username: "ada",
        email: "ada@clinic.test",
        password: "pw-123",
        confirm_password: "pw-123",
    })
    .expect("valid sign-up")
}

#[tokio::test]
async fn sign_up_stores_a_hash_with_admin_role() {
    let mut repo = MockUserRepository::new();
    repo.expect_is_taken()
        .times(1)
        .return_once(|_, _, except| {
            assert!(except.is_none());
            Ok(false)
        });
    repo.expect_insert().times(1).returning(|new| {
        assert_eq!(new.role, Role::Admin);
        assert!(new.password_hash.as_str().starts_with("$2b$10$"));
        assert_eq!(new.created_at, FixtureClock::march_2024().utc_now);
        Ok(UserAccount {
            id: UserId::new("1").expect("id"),
            username: Some(new.username.clone()),
            full_name: Some(new.full_name.clone()),
            email: new.email.clone(),
            role: new.role,
            created_at: Some(new.created_at),
        })
    });

    let created = make_service(repo)
        .sign_up(&sign_up_request())
        .await
        .expect("sign-up succeeds");
    assert_eq!(created.username.as_deref(), Some("ada"));
}

#[tokio::test]
async fn sign_up_conflict_skips_insert() {
    let mut repo = MockUserRepository::new();
    repo.expect_is_taken().return_once(|_, _, _| Ok(true));
    repo.expect_insert().never();

    let err = make_service(repo)
        .sign_up(&sign_up_request())
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn reset_target_for_unknown_email_is_not_found() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email().return_once(|_| Ok(None));

    let email = Email::new("nobody@clinic.test").expect("email");
    let err = make_service(repo)
        .find_reset_target(&email)
        .await
        .expect_err("not found");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn reset_password_writes_a_hash() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(account(Role::Admin))));
    repo.expect_update_password()
        .times(1)
        .returning(|_, hash| {
            let verified = verify_password(
                &Password::new("fresh"),
                &StoredCredential::Hashed(hash.clone()),
            );
            assert_eq!(verified, Ok(Verification::Verified));
            Ok(())
        });

    make_service(repo)
        .reset_password(&UserId::new("7").expect("id"), &Password::new("fresh"))
        .await
        .expect("reset succeeds");
}
