mod app;
mod auth;
mod config;
mod content;
mod cookies;
mod db;
mod error;
mod flash;
mod forms;
mod pages;
mod profile;
mod projects;
mod state;
mod storage;
mod templates;
mod uploads;

#[cfg(test)]
mod testing;

use crate::{auth::repo_types::User, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "portfolio=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // parse the embedded templates now rather than on the first request
    lazy_static::initialize(&templates::TEMPLATES);

    let app_state = AppState::init().await?;
    db::migrate(&app_state.db).await?;
    User::ensure_admin(&app_state.db, &app_state.config.admin).await?;

    let app = app::build_app(app_state);
    app::serve(app).await
}
