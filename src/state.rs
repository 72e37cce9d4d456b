use crate::config::AppConfig;
use crate::services::identity::IdentityProvider;
use crate::services::mail::Mailer;
use crate::store::DocumentStore;

pub struct AppState {
    pub store: Box<dyn DocumentStore>,
    pub config: AppConfig,
    pub identity: Box<dyn IdentityProvider>,
    pub mailer: Box<dyn Mailer>,
}
