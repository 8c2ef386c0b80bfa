mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{PASSWORD, app};

#[tokio::test]
async fn register_login_and_profile() {
    let app = app();
    let user = app
        .user_with_email("Ada@Example.com", json!({ "preferred_species": "dog", "min_age": 2 }))
        .await;
    assert_eq!(user.email, "Ada@Example.com");

    let (status, me) = app.get("/users/me", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["preferred_species"], "dog");
    assert_eq!(me["min_age"], 2);
    assert_eq!(me["is_email_verified"], false);
    assert_eq!(me["is_admin"], false);

    let (status, verify) = app.call(Method::POST, "/auth/verify", Some(&user.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verify["valid"], true);
    assert_eq!(verify["user_id"], user.id.as_str());
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = app();
    app.user("bob").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": "BOB@example.com",
                "first_name": "B",
                "last_name": "B",
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already registered");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_registrations_for_one_email_create_one_account() {
    let app = app();
    let body = || {
        Some(json!({
            "email": "race@example.com",
            "first_name": "R",
            "last_name": "R",
            "password": PASSWORD,
        }))
    };

    let (a, b, c, d) = tokio::join!(
        app.call(Method::POST, "/auth/register", None, body()),
        app.call(Method::POST, "/auth/register", None, body()),
        app.call(Method::POST, "/auth/register", None, body()),
        app.call(Method::POST, "/auth/register", None, body()),
    );
    let statuses = [a.0, b.0, c.0, d.0];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 3);

    let (status, _) = app.login("race@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = app();
    let (status, _) = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": "c@example.com",
                "first_name": "C",
                "last_name": "C",
                "password": "short",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = app();
    app.user("dana").await;
    let (status, _) = app.login("dana@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("nobody@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();
    let (status, body) = app.call(Method::GET, "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    let (status, _) = app.get("/users/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Public routes stay open.
    let (status, health) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn email_verification_with_issued_code() {
    let app = app();
    app.user("erin").await;
    let code = app.outbox.last_code_for("erin@example.com").expect("code sent");

    let wrong = if code == "000000" { "111111" } else { "000000" };
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/verify-email",
            None,
            Some(json!({ "email": "erin@example.com", "code": wrong })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid verification code");

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/verify-email",
            None,
            Some(json!({ "email": "erin@example.com", "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            Method::POST,
            "/auth/resend-code",
            None,
            Some(json!({ "email": "erin@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already verified");
}

#[tokio::test]
async fn too_many_failed_codes_lock_verification() {
    let app = app();
    app.user("finn").await;
    let code = app.outbox.last_code_for("finn@example.com").expect("code sent");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        let (status, _) = app
            .call(
                Method::POST,
                "/auth/verify-email",
                None,
                Some(json!({ "email": "finn@example.com", "code": wrong })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/verify-email",
            None,
            Some(json!({ "email": "finn@example.com", "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Too many failed attempts, request a new code");

    // A fresh code resets the counter.
    let (status, _) = app
        .call(
            Method::POST,
            "/auth/resend-code",
            None,
            Some(json!({ "email": "finn@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = app.outbox.last_code_for("finn@example.com").expect("fresh code");
    let (status, _) = app
        .call(
            Method::POST,
            "/auth/verify-email",
            None,
            Some(json!({ "email": "finn@example.com", "code": fresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn change_password_and_preferences() {
    let app = app();
    let user = app.user("gus").await;

    let (status, _) = app
        .put(
            "/users/change-password",
            &user.token,
            json!({
                "current_password": "nope-nope",
                "new_password": "another-pass",
                "new_password_confirm": "another-pass",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .put(
            "/users/change-password",
            &user.token,
            json!({
                "current_password": PASSWORD,
                "new_password": "another-pass",
                "new_password_confirm": "another-pass",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.login("gus@example.com", "another-pass").await;
    assert_eq!(status, StatusCode::OK);

    let (status, me) = app
        .put("/users/preferences", &user.token, json!({ "preferred_size": "small", "max_age": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["preferred_size"], "small");
    assert_eq!(me["max_age"], 5);

    let (status, _) = app
        .put("/users/preferences", &user.token, json!({ "min_age": 9 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preferred_ages_must_be_sane_months() {
    let app = app();
    let user = app.user("ivy").await;

    let (status, body) = app
        .put(
            "/users/preferences",
            &user.token,
            json!({ "min_age": i64::MAX, "max_age": i64::MAX }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Ages must be between 0 and 360 months");

    let (status, _) = app
        .put("/users/preferences", &user.token, json!({ "min_age": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/recommend?top_k=5", &user.token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": "young@example.com",
                "first_name": "Y",
                "last_name": "Y",
                "password": PASSWORD,
                "max_age": -3,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_soft_deletes_users() {
    let app = app();
    let admin = app.admin().await;
    let victim = app.user("hal").await;

    let (status, _) = app
        .delete(&format!("/users/{}", admin.id), &victim.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/users/{}", admin.id), &admin.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&format!("/users/{}", victim.id), &admin.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/users/{}", victim.id), &admin.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.login("hal@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, users) = app.get("/users", &admin.token).await;
    let emails: Vec<_> = users
        .as_array()
        .expect("array")
        .iter()
        .map(|u| u["email"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(emails, vec!["admin@example.com".to_string()]);
}
