use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::{info, instrument};
use validator::Validate;

use super::dto::ProfileForm;
use crate::{
    auth::{extractors::CurrentSession, repo_types::User},
    error::AppError,
    flash::{Flash, IncomingFlash},
    forms::{check_image_field, FieldErrors, MultipartForm},
    state::AppState,
    templates::{Page, PageContext},
    uploads::save_upload,
};

pub fn profile_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/admin/profile", get(edit_profile_page).post(edit_profile))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

fn render_form(
    user: &User,
    session: &CurrentSession,
    flash: IncomingFlash,
    form: &ProfileForm,
    errors: &FieldErrors,
) -> Result<Page, AppError> {
    let mut page = PageContext::new(Some(user), session, flash);
    page.insert("form", form);
    page.insert("errors", errors);
    page.render("admin/edit_profile.html")
}

#[instrument(skip_all)]
pub async fn edit_profile_page(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
) -> Result<Page, AppError> {
    let user = User::fetch_admin(&state.db).await?.ok_or(AppError::NotFound)?;
    render_form(&user, &session, flash, &ProfileForm::from_user(&user), &FieldErrors::default())
}

#[instrument(skip_all)]
pub async fn edit_profile(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
    mp: Multipart,
) -> Result<Response, AppError> {
    let user = User::fetch_admin(&state.db).await?.ok_or(AppError::NotFound)?;

    let mut submitted = MultipartForm::read(mp).await?;
    let form = ProfileForm::from_multipart(&submitted);
    let photo = submitted.take_file("profile_photo");

    let mut extra = FieldErrors::default();
    check_image_field(&mut extra, "profile_photo", photo.as_ref());
    let errors = FieldErrors::collect(form.validate(), extra);
    if !errors.is_empty() {
        return Ok(render_form(&user, &session, flash, &form, &errors)?.into_response());
    }

    let new_photo = match &photo {
        Some(file) => save_upload(state.storage.as_ref(), file, "profile").await?,
        None => None,
    };

    if !User::update_profile(&state.db, &form.into_changes(), new_photo.as_deref()).await? {
        return Err(AppError::NotFound);
    }
    info!(photo_changed = new_photo.is_some(), "profile updated");

    Ok(Flash::success("Profile updated successfully!").redirect("/admin/profile"))
}
