use std::time::{Duration, Instant, SystemTime};
use vocalis_db::{create_memory_pool, run_migrations};
use vocalis_identity::{
    authenticate, issue_token, issue_token_at, login, register, AuthFailure, Claims,
    IdentityError, NewUser, SqliteUserDirectory, TokenSettings, MIN_COST,
};

fn settings() -> TokenSettings {
    TokenSettings::new("integration-secret")
}

fn setup() -> SqliteUserDirectory {
    let pool = create_memory_pool().unwrap();
    let conn = pool.get().unwrap();
    run_migrations(&conn).unwrap();
    register(
        &conn,
        NewUser {
            username: "ana",
            email: "ana@example.com",
            password: "s3creta",
        },
        MIN_COST,
    )
    .unwrap();
    drop(conn);
    SqliteUserDirectory::new(pool)
}

fn claims_for(email: &str) -> Claims {
    let mut claims = Claims::new();
    claims.insert("sub".to_string(), email.into());
    claims
}

#[test]
fn login_token_authenticates_the_user() {
    let directory = setup();
    let grant = {
        let conn = directory.pool().get().unwrap();
        login(&conn, "ana@example.com", "s3creta", &settings(), None, MIN_COST).unwrap()
    };
    assert_eq!(grant.token_type, "bearer");
    assert_eq!(grant.username, "ana");

    let user = authenticate(&grant.access_token, &settings(), &directory).unwrap();
    assert_eq!(user.email, "ana@example.com");
}

#[test]
fn wrong_password_and_unknown_email_look_the_same() {
    let directory = setup();
    let conn = directory.pool().get().unwrap();

    let wrong = login(&conn, "ana@example.com", "nope", &settings(), None, MIN_COST).unwrap_err();
    let unknown = login(&conn, "beto@example.com", "s3creta", &settings(), None, MIN_COST).unwrap_err();

    assert!(matches!(wrong, IdentityError::InvalidLogin));
    assert!(matches!(unknown, IdentityError::InvalidLogin));
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[test]
fn unknown_email_pays_the_same_bcrypt_cost() {
    const COST: u32 = 8;
    let pool = create_memory_pool().unwrap();
    let conn = pool.get().unwrap();
    run_migrations(&conn).unwrap();
    register(
        &conn,
        NewUser {
            username: "ana",
            email: "ana@example.com",
            password: "s3creta",
        },
        COST,
    )
    .unwrap();

    let timed = |email: &str| {
        let started = Instant::now();
        let err = login(&conn, email, "nope", &settings(), None, COST).unwrap_err();
        assert!(matches!(err, IdentityError::InvalidLogin));
        started.elapsed()
    };
    let wrong_password = timed("ana@example.com");
    let unknown_email = timed("beto@example.com");

    assert!(
        unknown_email * 3 >= wrong_password,
        "unknown {unknown_email:?} vs wrong password {wrong_password:?}"
    );
}

#[test]
fn token_for_missing_user_is_unauthenticated() {
    let directory = setup();
    let token = issue_token(claims_for("fantasma@example.com"), None, &settings()).unwrap();

    match authenticate(&token, &settings(), &directory) {
        Err(IdentityError::Unauthenticated(AuthFailure::UnknownUser)) => {}
        other => panic!("expected unknown user, got {other:?}"),
    }
}

#[test]
fn token_without_subject_is_unauthenticated() {
    let directory = setup();
    let mut claims = Claims::new();
    claims.insert("role".to_string(), "student".into());
    let token = issue_token(claims, None, &settings()).unwrap();

    match authenticate(&token, &settings(), &directory) {
        Err(IdentityError::Unauthenticated(AuthFailure::MissingSubject)) => {}
        other => panic!("expected missing subject, got {other:?}"),
    }
}

#[test]
fn expired_token_for_real_user_is_unauthenticated() {
    let directory = setup();
    let token = issue_token_at(
        claims_for("ana@example.com"),
        Some(Duration::from_secs(60)),
        SystemTime::now() - Duration::from_secs(3600),
        &settings(),
    )
    .unwrap();

    let err = authenticate(&token, &settings(), &directory).unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(err.to_string(), "could not validate credentials");
}

#[test]
fn duplicate_registration_is_refused() {
    let directory = setup();
    let conn = directory.pool().get().unwrap();

    let err = register(
        &conn,
        NewUser {
            username: "otra ana",
            email: "ana@example.com",
            password: "x",
        },
        MIN_COST,
    )
    .unwrap_err();
    assert!(matches!(err, IdentityError::EmailTaken));
}

#[test]
fn registration_validates_fields() {
    let directory = setup();
    let conn = directory.pool().get().unwrap();

    let err = register(
        &conn,
        NewUser {
            username: "  ",
            email: "x@example.com",
            password: "x",
        },
        MIN_COST,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        IdentityError::InvalidField {
            field: "username",
            ..
        }
    ));

    let err = register(
        &conn,
        NewUser {
            username: "x",
            email: "no-es-email",
            password: "x",
        },
        MIN_COST,
    )
    .unwrap_err();
    assert!(matches!(err, IdentityError::InvalidField { field: "email", .. }));
}
