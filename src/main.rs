mod config;
mod handlers;
mod middleware;
mod models;
mod services;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{Config, StoreBackend},
    handlers::{admin, analytics, auth, evaluations, interviews, notifications, practice},
    middleware::auth::auth_middleware,
    services::{interview::InterviewEngine, notification::NotificationService, oracle::build_oracle},
    store::{InterviewStore, MemoryStore, PgStore},
    utils::database::create_pool,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InterviewStore>,
    pub engine: InterviewEngine,
    pub jwt_secret: String,
    pub jwt_expiry_minutes: i64,
    pub stale_session_days: i64,
}

pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/interviews/start", post(interviews::start_interview))
        .route("/interviews/answer", post(interviews::submit_answer))
        .route("/interviews/history", get(interviews::get_history))
        .route("/interviews/:id", get(interviews::get_interview))
        .route("/interviews/:id/complete", post(interviews::complete_interview))
        .route("/evaluations/:interview_id", get(evaluations::get_evaluation))
        .route("/analytics/dashboard", get(analytics::get_dashboard))
        .route("/admin/dashboard", get(admin::get_dashboard))
        .route("/admin/users", get(admin::get_users))
        .route("/admin/users/:user_id", get(admin::get_user_detail))
        .route("/admin/insights", get(admin::get_insights))
        .route(
            "/admin/notifications/trigger",
            post(notifications::trigger_notifications),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/practice/questions/:category", get(practice::get_practice_questions))
        .merge(protected_routes);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api)
        .with_state(state)
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origin == "*" {
        HeaderValue::from_static("*")
    } else {
        origin.parse::<HeaderValue>()?
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]))
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn InterviewStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let db = create_pool(database_url, config.database_max_connections).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Ok(Arc::new(PgStore::new(db)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_coach_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = open_store(&config).await?;

    if let Some(password) = &config.admin_password {
        auth::seed_admin(store.as_ref(), &config.admin_email, password).await?;
    }

    let oracle = build_oracle(&config.oracle);
    let engine = InterviewEngine::new(store.clone(), oracle, config.oracle.timeout);

    let state = AppState {
        store: store.clone(),
        engine,
        jwt_secret: config.jwt_secret.clone(),
        jwt_expiry_minutes: config.jwt_expiry_minutes,
        stale_session_days: config.stale_session_days,
    };

    let app = build_router(state).layer(cors_layer(&config.cors_origin)?);

    // Start background reminder scheduler
    let reminder_store = store.clone();
    let stale_days = config.stale_session_days;
    tokio::spawn(async move {
        use tokio_cron_scheduler::{Job, JobScheduler};

        let sched = JobScheduler::new()
            .await
            .expect("Failed to create scheduler");

        // Daily at 9 AM
        let job = Job::new_async("0 0 9 * * *", move |_uuid, _l| {
            let store = reminder_store.clone();
            Box::pin(async move {
                let notification_service = NotificationService::new(store);
                match notification_service.process_stale_sessions(stale_days).await {
                    Ok(report) => tracing::info!(
                        "Stale session reminders sent to {} users ({} sessions)",
                        report.processed_users,
                        report.total_stale_sessions
                    ),
                    Err(e) => tracing::error!("Failed to process reminders: {}", e),
                }
            })
        })
        .expect("Failed to create reminder job");

        sched.add(job).await.expect("Failed to add job");
        sched.start().await.expect("Failed to start scheduler");

        tracing::info!("Reminder scheduler started - running daily at 9 AM");

        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
