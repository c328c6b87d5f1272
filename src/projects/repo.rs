use sqlx::SqlitePool;

use super::repo_types::{ContentImages, Project, ProjectFields, ProjectRow};
use crate::{db, error::AppError};

impl Project {
    /// Published projects, newest first.
    pub async fn list_published(db: &SqlitePool) -> Result<Vec<Project>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, title, description, content, github_url, image_path, content_images,
                   published, created_at, updated_at
            FROM projects
            WHERE published = 1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    pub async fn list_all(db: &SqlitePool) -> Result<Vec<Project>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, title, description, content, github_url, image_path, content_images,
                   published, created_at, updated_at
            FROM projects
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<Project>, sqlx::Error> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, title, description, content, github_url, image_path, content_images,
                   published, created_at, updated_at
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row.map(Project::from))
    }

    pub async fn get_or_404(db: &SqlitePool, id: i64) -> Result<Project, AppError> {
        Project::find_by_id(db, id).await?.ok_or(AppError::NotFound)
    }

    pub async fn insert(
        db: &SqlitePool,
        fields: &ProjectFields,
        image_path: Option<&str>,
        content_images: &ContentImages,
    ) -> Result<Project, sqlx::Error> {
        let now = db::now();
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects (title, description, content, github_url, image_path,
                                  content_images, published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, title, description, content, github_url, image_path, content_images,
                      published, created_at, updated_at
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.content)
        .bind(&fields.github_url)
        .bind(image_path.unwrap_or_default())
        .bind(content_images.encode())
        .bind(fields.published)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await?;
        Ok(row.into())
    }

    /// Overwrites the text fields, appends `new_images` to the stored list and
    /// replaces the cover only when `new_cover` is given. Returns `None` when
    /// the project does not exist.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        fields: &ProjectFields,
        new_cover: Option<&str>,
        new_images: Vec<String>,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = db.begin().await?;

        let Some(raw) = sqlx::query_scalar::<_, String>(
            "SELECT content_images FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        let mut images = ContentImages::decode(id, &raw);
        images.extend(new_images);

        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            UPDATE projects
            SET title = ?, description = ?, content = ?, github_url = ?, published = ?,
                image_path = COALESCE(?, image_path),
                content_images = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING id, title, description, content, github_url, image_path, content_images,
                      published, created_at, updated_at
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.content)
        .bind(&fields.github_url)
        .bind(fields.published)
        .bind(new_cover)
        .bind(images.encode())
        .bind(db::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    /// Removes the row only; uploaded files stay where they are.
    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Drops `path` from the project's content images in one transaction.
    /// `None` when the project does not exist, otherwise whether the path
    /// was listed.
    pub async fn remove_content_image(
        db: &SqlitePool,
        id: i64,
        path: &str,
    ) -> Result<Option<bool>, sqlx::Error> {
        let mut tx = db.begin().await?;

        let Some(raw) = sqlx::query_scalar::<_, String>(
            "SELECT content_images FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let mut images = ContentImages::decode(id, &raw);
        if !images.remove(path) {
            return Ok(Some(false));
        }

        sqlx::query("UPDATE projects SET content_images = ?, updated_at = ? WHERE id = ?")
            .bind(images.encode())
            .bind(db::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(true))
    }
}
