use std::sync::Arc;

use chrono::Duration;
use pawhaven_db::Database;
use pawhaven_recommender::Recommender;

use crate::verification::{LogSender, VerificationSender};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Key for the HMAC that stores email verification codes.
    pub verify_code_secret: String,
    /// Shop WhatsApp number, digits only. Checkout links are blank without it.
    pub whatsapp_number: Option<String>,
    /// Lower-cased addresses that register as administrators.
    pub admin_emails: Vec<String>,
    pub recommender: Recommender,
    pub verification: Box<dyn VerificationSender>,
}

impl AppStateInner {
    /// State with defaults around `db`; the binary and tests override fields.
    pub fn new(db: Database, jwt_secret: impl Into<String>) -> Self {
        Self {
            db,
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::minutes(30),
            verify_code_secret: "dev-verify-secret-change-me".into(),
            whatsapp_number: None,
            admin_emails: Vec::new(),
            recommender: Recommender::default(),
            verification: Box::new(LogSender),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|a| *a == email)
    }
}
