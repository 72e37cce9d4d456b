use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub firebase_api_key: String,
    pub resend_api_key: String,
    pub mail_from: String,
    pub conflict_policy: ConflictPolicy,
}

/// What to do when a new booking lands on a date/time slot that an active
/// booking already holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Accept the booking and flag the clash in the response.
    Allow,
    /// Refuse the booking with a validation error.
    Reject,
}

impl ConflictPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(ConflictPolicy::Allow),
            "reject" => Some(ConflictPolicy::Reject),
            _ => None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "servicebay.db".to_string()),
            firebase_api_key: env::var("FIREBASE_API_KEY").unwrap_or_default(),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "ServiceBay <onboarding@resend.dev>".to_string()),
            conflict_policy: env::var("BOOKING_CONFLICT_POLICY")
                .ok()
                .and_then(|v| ConflictPolicy::parse(&v))
                .unwrap_or(ConflictPolicy::Allow),
        }
    }
}
