use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::warn;

/// Raw `projects` row; `content_images` is still serialized JSON.
#[derive(Debug, FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub github_url: String,
    pub image_path: String,
    pub content_images: String,
    pub published: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,        // markdown
    pub github_url: String,
    pub image_path: String,     // cover, empty when unset
    pub content_images: ContentImages,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ProjectRow> for Project {
    fn from(r: ProjectRow) -> Self {
        let content_images = ContentImages::decode(r.id, &r.content_images);
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            content: r.content,
            github_url: r.github_url,
            image_path: r.image_path,
            content_images,
            published: r.published,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Editable columns of a project; image columns are handled separately.
#[derive(Debug, Clone)]
pub struct ProjectFields {
    pub title: String,
    pub description: String,
    pub content: String,
    pub github_url: String,
    pub published: bool,
}

/// Ordered web paths of a project's inline images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContentImages(Vec<String>);

impl ContentImages {
    /// Never fails: a missing or corrupt column reads as an empty list.
    pub fn decode(project_id: i64, raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(paths) => Self(paths),
            Err(e) => {
                warn!(project_id, error = %e, "corrupt content_images, treating as empty");
                Self::default()
            }
        }
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".into())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops the first entry equal to `path`; the rest keep their order.
    pub fn remove(&mut self, path: &str) -> bool {
        match self.0.iter().position(|p| p == path) {
            Some(i) => {
                self.0.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, paths: I) {
        self.0.extend(paths);
    }
}

impl From<Vec<String>> for ContentImages {
    fn from(paths: Vec<String>) -> Self {
        Self(paths)
    }
}
