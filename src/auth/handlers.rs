use axum::{
    extract::{FromRef, Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    auth::{
        dto::{LoginForm, LoginQuery},
        extractors::{safe_next, CurrentSession},
        repo_types::User,
        services::authenticate,
        session::SessionKeys,
    },
    error::AppError,
    flash::{Flash, IncomingFlash},
    forms::FieldErrors,
    state::AppState,
    templates::{Page, PageContext},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

async fn render_login(
    state: &AppState,
    session: &CurrentSession,
    flash: IncomingFlash,
    form: &LoginForm,
    errors: &FieldErrors,
    next: Option<&str>,
    message: Option<Flash>,
) -> Result<Page, AppError> {
    let owner = User::fetch_admin(&state.db).await?;
    let mut page = PageContext::new(owner.as_ref(), session, flash);
    page.insert("form", form);
    page.insert("errors", errors);
    page.insert("next", &safe_next(next));
    if let Some(m) = message {
        page.flash_now(m);
    }
    page.render("login.html")
}

#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if session.is_authenticated() {
        return Ok(Redirect::to("/admin").into_response());
    }
    let page = render_login(
        &state,
        &session,
        flash,
        &LoginForm::default(),
        &FieldErrors::default(),
        query.next.as_deref(),
        None,
    )
    .await?;
    Ok(page.into_response())
}

#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let errors = FieldErrors::from_validation(form.validate());
    if !errors.is_empty() {
        let page = render_login(&state, &session, flash, &form, &errors, query.next.as_deref(), None)
            .await?;
        return Ok(page.into_response());
    }

    let Some(user) = authenticate(&state.db, &form.username, &form.password).await? else {
        let page = render_login(
            &state,
            &session,
            flash,
            &form,
            &errors,
            query.next.as_deref(),
            Some(Flash::danger("Invalid username or password.")),
        )
        .await?;
        return Ok(page.into_response());
    };

    let keys = SessionKeys::from_ref(&state);
    let session_cookie = keys.session_cookie(user.id)?;
    let target = safe_next(query.next.as_deref()).unwrap_or("/admin");

    Ok((
        AppendHeaders([
            (SET_COOKIE, session_cookie),
            (SET_COOKIE, Flash::success("Logged in successfully!").set_cookie()),
        ]),
        Redirect::to(target),
    )
        .into_response())
}

#[instrument(skip_all)]
pub async fn logout() -> Response {
    info!("admin logged out");
    (
        AppendHeaders([
            (SET_COOKIE, SessionKeys::clear_cookie()),
            (SET_COOKIE, Flash::info("Logged out successfully").set_cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}
