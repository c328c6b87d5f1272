use sqlx::SqlitePool;
use tracing::{info, warn};

use super::repo_types::{ContentImages, Project, ProjectFields};
use crate::{
    error::AppError,
    storage::StorageClient,
    uploads::{delete_upload, save_upload, UploadedFile},
};

const PROJECT_FOLDER: &str = "projects";

/// Files kept from one submission.
#[derive(Debug, Default)]
pub struct SavedImages {
    pub cover: Option<String>,
    pub content: Vec<String>,
    pub skipped: usize,
}

/// Stores the cover and every content image that is an allowed type. Content
/// images of other types are skipped one by one.
pub async fn save_images(
    storage: &dyn StorageClient,
    cover: Option<&UploadedFile>,
    content: &[UploadedFile],
) -> anyhow::Result<SavedImages> {
    let mut saved = SavedImages::default();
    if let Some(file) = cover {
        saved.cover = save_upload(storage, file, PROJECT_FOLDER).await?;
    }
    for file in content {
        match save_upload(storage, file, PROJECT_FOLDER).await? {
            Some(path) => saved.content.push(path),
            None => {
                warn!(file_name = %file.file_name, "content image skipped");
                saved.skipped += 1;
            }
        }
    }
    Ok(saved)
}

/// Creates a project and returns it with the number of skipped content images.
pub async fn create_project(
    db: &SqlitePool,
    storage: &dyn StorageClient,
    fields: &ProjectFields,
    cover: Option<&UploadedFile>,
    content: &[UploadedFile],
) -> Result<(Project, usize), AppError> {
    let saved = save_images(storage, cover, content).await?;
    let images = ContentImages::from(saved.content);
    let project = Project::insert(db, fields, saved.cover.as_deref(), &images).await?;
    info!(
        project_id = project.id,
        content_images = project.content_images.as_slice().len(),
        skipped = saved.skipped,
        "project created"
    );
    Ok((project, saved.skipped))
}

pub async fn update_project(
    db: &SqlitePool,
    storage: &dyn StorageClient,
    id: i64,
    fields: &ProjectFields,
    cover: Option<&UploadedFile>,
    content: &[UploadedFile],
) -> Result<(Project, usize), AppError> {
    let saved = save_images(storage, cover, content).await?;
    let project = Project::update(db, id, fields, saved.cover.as_deref(), saved.content)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(
        project_id = project.id,
        content_images = project.content_images.as_slice().len(),
        skipped = saved.skipped,
        "project updated"
    );
    Ok((project, saved.skipped))
}

#[derive(Debug, PartialEq, Eq)]
pub enum ImageRemoval {
    Removed,
    NotListed,
}

/// Unlists one content image, then removes the file. The file removal runs
/// after the commit and its failure is only logged.
pub async fn delete_content_image(
    db: &SqlitePool,
    storage: &dyn StorageClient,
    id: i64,
    path: &str,
) -> Result<ImageRemoval, AppError> {
    match Project::remove_content_image(db, id, path).await? {
        None => Err(AppError::NotFound),
        Some(false) => {
            warn!(project_id = id, %path, "content image not listed");
            Ok(ImageRemoval::NotListed)
        }
        Some(true) => {
            if let Err(e) = delete_upload(storage, path).await {
                warn!(project_id = id, %path, error = %e, "content image file not removed");
            }
            info!(project_id = id, %path, "content image deleted");
            Ok(ImageRemoval::Removed)
        }
    }
}

/// Success message after a save, mentioning skipped content images.
pub fn saved_message(verb: &str, skipped: usize) -> String {
    match skipped {
        0 => format!("Project {verb} successfully!"),
        1 => format!("Project {verb} successfully! 1 file was skipped (images only)."),
        n => format!("Project {verb} successfully! {n} files were skipped (images only)."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, storage::LocalStorage, uploads::object_key_for};
    use bytes::Bytes;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.into(),
            body: Bytes::from_static(b"img"),
        }
    }

    fn fields() -> ProjectFields {
        ProjectFields {
            title: "Robot".into(),
            description: "A robot".into(),
            content: "It moves.".into(),
            github_url: String::new(),
            published: true,
        }
    }

    #[tokio::test]
    async fn only_allowed_content_images_are_stored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let db = db::memory().await.unwrap();

        let files = [file("a.png"), file("notes.txt"), file("b.JPG"), file("x.exe")];
        let (project, skipped) = create_project(&db, &storage, &fields(), None, &files)
            .await
            .unwrap();

        assert_eq!(skipped, 2);
        assert_eq!(project.content_images.len(), 2);
        for path in project.content_images.as_slice() {
            assert!(storage.exists(object_key_for(path).unwrap()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn deleting_an_image_removes_entry_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let db = db::memory().await.unwrap();

        let (project, _) = create_project(
            &db,
            &storage,
            &fields(),
            None,
            &[file("one.png"), file("two.png")],
        )
        .await
        .unwrap();
        let first = project.content_images.as_slice()[0].clone();
        let second = project.content_images.as_slice()[1].clone();

        let outcome = delete_content_image(&db, &storage, project.id, &first).await.unwrap();
        assert_eq!(outcome, ImageRemoval::Removed);
        assert!(!storage.exists(object_key_for(&first).unwrap()).await.unwrap());

        let again = delete_content_image(&db, &storage, project.id, &first).await.unwrap();
        assert_eq!(again, ImageRemoval::NotListed);

        let stored = Project::find_by_id(&db, project.id).await.unwrap().unwrap();
        assert_eq!(stored.content_images.as_slice(), [second]);

        assert!(matches!(
            delete_content_image(&db, &storage, 12345, &first).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn listed_path_outside_uploads_is_unlisted_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let db = db::memory().await.unwrap();
        let images = ContentImages::from(vec!["../escape.png".to_string()]);
        let project = Project::insert(&db, &fields(), None, &images).await.unwrap();

        let outcome = delete_content_image(&db, &storage, project.id, "../escape.png")
            .await
            .unwrap();
        assert_eq!(outcome, ImageRemoval::Removed);
    }

    #[test]
    fn saved_message_mentions_skips() {
        assert_eq!(saved_message("created", 0), "Project created successfully!");
        assert!(saved_message("updated", 1).contains("1 file was skipped"));
        assert!(saved_message("created", 3).contains("3 files were skipped"));
    }
}
