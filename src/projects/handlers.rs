use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument};
use validator::Validate;

use super::{
    dto::ProjectForm,
    repo_types::Project,
    services::{create_project, delete_content_image, saved_message, update_project, ImageRemoval},
};
use crate::{
    auth::{extractors::CurrentSession, repo_types::User},
    error::AppError,
    flash::{Flash, IncomingFlash},
    forms::{check_image_field, FieldErrors, MultipartForm},
    state::AppState,
    templates::{Page, PageContext},
    uploads::UploadedFile,
};

pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/project/new", get(new_project_page).post(new_project))
        .route("/admin/project/:id/edit", get(edit_project_page).post(edit_project))
        .route("/admin/project/:id/delete", post(delete_project))
        .route("/admin/project/:id/delete-image/*path", get(delete_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Project ids that are not integers cannot exist.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}

fn edit_url(id: i64) -> String {
    format!("/admin/project/{id}/edit")
}

struct FormView<'a> {
    form: &'a ProjectForm,
    errors: &'a FieldErrors,
    project: Option<&'a Project>,
}

async fn render_form(
    state: &AppState,
    session: &CurrentSession,
    flash: IncomingFlash,
    view: FormView<'_>,
) -> Result<Page, AppError> {
    let owner = User::fetch_admin(&state.db).await?;
    let mut page = PageContext::new(owner.as_ref(), session, flash);
    let title = if view.project.is_some() { "Edit Project" } else { "New Project" };
    page.insert("title", title);
    page.insert("form", view.form);
    page.insert("errors", view.errors);
    page.insert("project", &view.project);
    page.render("admin/project_form.html")
}

/// Text fields plus file parts of a submitted project form.
struct Submission {
    form: ProjectForm,
    cover: Option<UploadedFile>,
    content: Vec<UploadedFile>,
    errors: FieldErrors,
}

async fn read_submission(mp: Multipart) -> Result<Submission, AppError> {
    let mut submitted = MultipartForm::read(mp).await?;
    let form = ProjectForm::from_multipart(&submitted);
    let cover = submitted.take_file("image");
    let content = submitted.take_files("content_images");

    let mut extra = FieldErrors::default();
    check_image_field(&mut extra, "image", cover.as_ref());
    let errors = FieldErrors::collect(form.validate(), extra);

    Ok(Submission {
        form,
        cover,
        content,
        errors,
    })
}

#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
) -> Result<Page, AppError> {
    let owner = User::fetch_admin(&state.db).await?;
    let projects = Project::list_all(&state.db).await?;
    let mut page = PageContext::new(owner.as_ref(), &session, flash);
    page.insert("projects", &projects);
    page.render("admin/dashboard.html")
}

#[instrument(skip_all)]
pub async fn new_project_page(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
) -> Result<Page, AppError> {
    let view = FormView {
        form: &ProjectForm::default(),
        errors: &FieldErrors::default(),
        project: None,
    };
    render_form(&state, &session, flash, view).await
}

#[instrument(skip_all)]
pub async fn new_project(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
    mp: Multipart,
) -> Result<Response, AppError> {
    let sub = read_submission(mp).await?;
    if !sub.errors.is_empty() {
        let view = FormView {
            form: &sub.form,
            errors: &sub.errors,
            project: None,
        };
        return Ok(render_form(&state, &session, flash, view).await?.into_response());
    }

    let (_, skipped) = create_project(
        &state.db,
        state.storage.as_ref(),
        &sub.form.into_fields(),
        sub.cover.as_ref(),
        &sub.content,
    )
    .await?;

    Ok(Flash::success(saved_message("created", skipped)).redirect("/admin"))
}

#[instrument(skip(state, session, flash))]
pub async fn edit_project_page(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let project = Project::get_or_404(&state.db, parse_id(&id)?).await?;
    let view = FormView {
        form: &ProjectForm::from_project(&project),
        errors: &FieldErrors::default(),
        project: Some(&project),
    };
    render_form(&state, &session, flash, view).await
}

#[instrument(skip(state, session, flash, mp))]
pub async fn edit_project(
    State(state): State<AppState>,
    session: CurrentSession,
    flash: IncomingFlash,
    Path(id): Path<String>,
    mp: Multipart,
) -> Result<Response, AppError> {
    let project = Project::get_or_404(&state.db, parse_id(&id)?).await?;

    let sub = read_submission(mp).await?;
    if !sub.errors.is_empty() {
        let view = FormView {
            form: &sub.form,
            errors: &sub.errors,
            project: Some(&project),
        };
        return Ok(render_form(&state, &session, flash, view).await?.into_response());
    }

    let (_, skipped) = update_project(
        &state.db,
        state.storage.as_ref(),
        project.id,
        &sub.form.into_fields(),
        sub.cover.as_ref(),
        &sub.content,
    )
    .await?;

    Ok(Flash::success(saved_message("updated", skipped)).redirect("/admin"))
}

#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    if !Project::delete(&state.db, id).await? {
        return Err(AppError::NotFound);
    }
    info!(project_id = id, "project deleted");
    Ok(Flash::success("Project deleted successfully!").redirect("/admin"))
}

#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let flash = match delete_content_image(&state.db, state.storage.as_ref(), id, &path).await? {
        ImageRemoval::Removed => Flash::success("Image deleted."),
        ImageRemoval::NotListed => Flash::warning("Image not found on this project."),
    };
    Ok(flash.redirect(&edit_url(id)))
}
