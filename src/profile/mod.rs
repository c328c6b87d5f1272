mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().merge(handlers::profile_routes(max_upload_bytes))
}
