#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use pawhaven_api::state::AppStateInner;
use pawhaven_api::verification::VerificationSender;
use pawhaven_db::Database;

pub const PASSWORD: &str = "correct-horse";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Remembers every code handed out, newest last.
#[derive(Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<(String, String)>>>);

impl Outbox {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.0
            .lock()
            .expect("outbox lock")
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

impl VerificationSender for Outbox {
    fn send(&self, email: &str, code: &str) -> anyhow::Result<()> {
        self.0
            .lock()
            .expect("outbox lock")
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub outbox: Outbox,
}

pub struct User {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub fn app() -> TestApp {
    app_with(|_| {})
}

pub fn app_with(configure: impl FnOnce(&mut AppStateInner)) -> TestApp {
    let outbox = Outbox::default();
    let db = Database::open_in_memory().expect("in-memory db");
    let mut state = AppStateInner::new(db, "test-secret");
    state.admin_emails = vec![ADMIN_EMAIL.to_string()];
    state.verification = Box::new(outbox.clone());
    configure(&mut state);
    TestApp {
        router: pawhaven_api::router(Arc::new(state)),
        outbox,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("router is infallible");
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(req).await
    }

    pub async fn form(&self, uri: &str, token: Option<&str>, form: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(form.to_string())).expect("request"))
            .await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.form(
            "/auth/token",
            None,
            &format!("username={email}&password={password}&grant_type=password"),
        )
        .await
    }

    /// Register `name@example.com` and log in.
    pub async fn user(&self, name: &str) -> User {
        self.user_with_email(&format!("{name}@example.com"), json!({})).await
    }

    pub async fn user_with_email(&self, email: &str, extra: Value) -> User {
        let mut body = json!({
            "email": email,
            "first_name": "Test",
            "last_name": "User",
            "password": PASSWORD,
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        let (status, created) = self.call(Method::POST, "/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "register {email}: {created}");

        let (status, token) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login {email}: {token}");
        User {
            id: created["id"].as_str().expect("id").to_string(),
            email: email.to_string(),
            token: token["access_token"].as_str().expect("token").to_string(),
        }
    }

    pub async fn admin(&self) -> User {
        self.user_with_email(ADMIN_EMAIL, json!({})).await
    }

    /// The user's leaderboard row, or `Value::Null` when they have none.
    pub async fn score(&self, user: &User) -> Value {
        let (status, body) = self
            .call(Method::GET, &format!("/leaderboard/{}", user.id), None, None)
            .await;
        if status == StatusCode::NOT_FOUND {
            Value::Null
        } else {
            body
        }
    }
}
