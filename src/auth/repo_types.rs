use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Fixed id of the single admin row.
pub const ADMIN_ID: i64 = 1;

/// The site owner: login credentials plus every piece of public profile data.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, never rendered
    pub email: String,
    pub display_name: String,
    pub bio_header: String,
    pub bio: String,
    pub about_text: String,           // markdown
    pub profile_photo_path: String,   // web path under uploads/, empty when unset
    pub linkedin_url: String,
    pub github_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Unsaved admin with the bootstrap profile defaults and no password yet.
    pub fn new_admin(username: &str, email: &str) -> Self {
        let now = crate::db::now();
        Self {
            id: ADMIN_ID,
            username: username.to_string(),
            password_hash: String::new(),
            email: email.to_string(),
            display_name: "Admin User".into(),
            bio_header: "Portfolio Administrator".into(),
            bio: String::new(),
            about_text: String::new(),
            profile_photo_path: String::new(),
            linkedin_url: String::new(),
            github_url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Text fields written by a profile edit.
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub display_name: String,
    pub bio_header: String,
    pub bio: String,
    pub about_text: String,
    pub email: String,
    pub linkedin_url: String,
    pub github_url: String,
}
