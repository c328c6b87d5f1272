use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    auth::{extractors::CurrentSession, repo_types::User},
    content::render_content,
    error::AppError,
    flash::IncomingFlash,
    projects::{handlers::parse_id, repo_types::Project},
    state::AppState,
    templates::{Page, PageContext},
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
        .route("/project/:id", get(project))
}

#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
) -> Result<Page, AppError> {
    let owner = User::fetch_admin(&state.db).await?;
    let projects = Project::list_published(&state.db).await?;
    let mut page = PageContext::new(owner.as_ref(), &session, flash);
    page.insert("projects", &projects);
    page.render("index.html")
}

#[instrument(skip_all)]
pub async fn about(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
) -> Result<Page, AppError> {
    let owner = User::fetch_admin(&state.db).await?;
    let about_html = owner
        .as_ref()
        .map(|u| render_content(&u.about_text))
        .unwrap_or_default();
    let mut page = PageContext::new(owner.as_ref(), &session, flash);
    page.insert("about_html", &about_html);
    page.render("about.html")
}

/// Unpublished projects are only visible to a logged-in admin.
#[instrument(skip(state, session, flash))]
pub async fn project(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let project = Project::get_or_404(&state.db, parse_id(&id)?).await?;
    if !project.published && !session.is_authenticated() {
        return Err(AppError::NotFound);
    }

    let owner = User::fetch_admin(&state.db).await?;
    let mut page = PageContext::new(owner.as_ref(), &session, flash);
    page.insert("project_html", &render_content(&project.content));
    page.insert("project", &project);
    page.render("project.html")
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
