use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use servicebay::config::AppConfig;
use servicebay::handlers;
use servicebay::services::identity::firebase::FirebaseAuthClient;
use servicebay::services::mail::resend::ResendMailer;
use servicebay::state::AppState;
use servicebay::store::{DocumentStore, MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store: Box<dyn DocumentStore> = match config.database_url.as_str() {
        "memory" => {
            tracing::info!("using in-memory document store");
            Box::new(MemoryStore::new())
        }
        path => {
            tracing::info!("using sqlite document store at {path}");
            Box::new(SqliteStore::open(path)?)
        }
    };

    anyhow::ensure!(
        !config.firebase_api_key.is_empty(),
        "FIREBASE_API_KEY must be set"
    );
    if config.resend_api_key.is_empty() {
        tracing::warn!("RESEND_API_KEY is not set; verification emails will fail");
    }

    let identity = FirebaseAuthClient::new(config.firebase_api_key.clone());
    let mailer = ResendMailer::new(config.resend_api_key.clone());

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        identity: Box::new(identity),
        mailer: Box::new(mailer),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/check-username",
            post(handlers::auth::check_username),
        )
        .route("/api/auth/check-email", post(handlers::auth::check_email))
        .route(
            "/api/auth/email-by-username",
            post(handlers::auth::email_by_username),
        )
        .route("/api/auth/verify-role", get(handlers::auth::verify_role))
        .route("/api/auth/send-otp", post(handlers::auth::send_otp))
        .route("/api/auth/verify-otp", post(handlers::auth::verify_otp))
        .route("/api/auth/resend-otp", post(handlers::auth::resend_otp))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route("/api/bookings/:id", put(handlers::bookings::update_booking))
        .route(
            "/api/bookings/:id",
            delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:id/accept-suggestion",
            post(handlers::bookings::accept_suggestion),
        )
        .route(
            "/api/bookings/:id/reject-suggestion",
            post(handlers::bookings::reject_suggestion),
        )
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::update_status),
        )
        .route(
            "/api/admin/bookings/:id/suggest",
            post(handlers::admin::suggest_datetime),
        )
        .route("/api/reviews", post(handlers::reviews::create_review))
        .route("/api/reviews", get(handlers::reviews::list_reviews))
        .route("/api/reviews/:id", put(handlers::reviews::moderate_review))
        .route("/api/reviews/:id", delete(handlers::reviews::delete_review))
        .route("/api/users/:id", get(handlers::users::get_user))
        .route("/api/users/:id", put(handlers::users::update_user))
        .route("/api/users/:id", delete(handlers::users::delete_user))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
