use anyhow::Context;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::repo_types::{ProfileChanges, User, ADMIN_ID};
use crate::config::AdminConfig;

impl User {
    /// The singleton admin, if it has been bootstrapped.
    pub async fn fetch_admin(db: &SqlitePool) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, display_name, bio_header, bio,
                   about_text, profile_photo_path, linkedin_url, github_url,
                   created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(ADMIN_ID)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, display_name, bio_header, bio,
                   about_text, profile_photo_path, linkedin_url, github_url,
                   created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    /// Inserts the admin row; `ON CONFLICT` keeps an existing admin untouched.
    pub async fn insert(&self, db: &SqlitePool) -> Result<bool, sqlx::Error> {
        let res = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, email, display_name, bio_header,
                               bio, about_text, profile_photo_path, linkedin_url, github_url,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(self.id)
        .bind(&self.username)
        .bind(&self.password_hash)
        .bind(&self.email)
        .bind(&self.display_name)
        .bind(&self.bio_header)
        .bind(&self.bio)
        .bind(&self.about_text)
        .bind(&self.profile_photo_path)
        .bind(&self.linkedin_url)
        .bind(&self.github_url)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Creates the admin from configuration unless one exists. Returns whether
    /// a row was created.
    pub async fn ensure_admin(db: &SqlitePool, admin: &AdminConfig) -> anyhow::Result<bool> {
        if let Some(existing) = User::fetch_admin(db).await.context("load admin")? {
            info!(username = %existing.username, "admin user exists");
            return Ok(false);
        }

        let mut user = User::new_admin(&admin.username, &admin.email);
        user.set_password(&admin.password)?;
        let created = user.insert(db).await.context("insert admin")?;
        if created {
            info!(username = %user.username, "admin user created");
        }
        Ok(created)
    }

    /// Overwrites every text field. The photo only changes when `new_photo`
    /// is given.
    pub async fn update_profile(
        db: &SqlitePool,
        changes: &ProfileChanges,
        new_photo: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET display_name = ?, bio_header = ?, bio = ?, about_text = ?, email = ?,
                linkedin_url = ?, github_url = ?,
                profile_photo_path = COALESCE(?, profile_photo_path),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.display_name)
        .bind(&changes.bio_header)
        .bind(&changes.bio)
        .bind(&changes.about_text)
        .bind(&changes.email)
        .bind(&changes.linkedin_url)
        .bind(&changes.github_url)
        .bind(new_photo)
        .bind(crate::db::now())
        .bind(ADMIN_ID)
        .execute(db)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn admin_config() -> AdminConfig {
        AdminConfig {
            username: "owner".into(),
            password: "s3cret".into(),
            email: "owner@example.com".into(),
        }
    }

    fn changes() -> ProfileChanges {
        ProfileChanges {
            display_name: "Jane".into(),
            bio_header: "Engineer".into(),
            bio: "Builds things.".into(),
            about_text: "# About".into(),
            email: "jane@example.com".into(),
            linkedin_url: String::new(),
            github_url: "https://github.com/jane".into(),
        }
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let db = db::memory().await.unwrap();
        assert!(User::fetch_admin(&db).await.unwrap().is_none());

        assert!(User::ensure_admin(&db, &admin_config()).await.unwrap());
        assert!(!User::ensure_admin(&db, &admin_config()).await.unwrap());

        let admin = User::fetch_admin(&db).await.unwrap().unwrap();
        assert_eq!(admin.id, ADMIN_ID);
        assert_eq!(admin.username, "owner");
        assert_eq!(admin.display_name, "Admin User");
        assert_ne!(admin.password_hash, "s3cret");
        assert!(admin.check_password("s3cret"));
    }

    #[tokio::test]
    async fn find_by_username_matches_exactly() {
        let db = db::memory().await.unwrap();
        User::ensure_admin(&db, &admin_config()).await.unwrap();
        assert!(User::find_by_username(&db, "owner").await.unwrap().is_some());
        assert!(User::find_by_username(&db, "Owner").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_profile_keeps_photo_without_new_file() {
        let db = db::memory().await.unwrap();
        User::ensure_admin(&db, &admin_config()).await.unwrap();

        User::update_profile(&db, &changes(), Some("uploads/profile/me.png"))
            .await
            .unwrap();
        let mut second = changes();
        second.bio = "Updated".into();
        assert!(User::update_profile(&db, &second, None).await.unwrap());

        let admin = User::fetch_admin(&db).await.unwrap().unwrap();
        assert_eq!(admin.bio, "Updated");
        assert_eq!(admin.github_url, "https://github.com/jane");
        assert_eq!(admin.profile_photo_path, "uploads/profile/me.png");
    }

    #[tokio::test]
    async fn update_profile_without_admin_touches_nothing() {
        let db = db::memory().await.unwrap();
        assert!(!User::update_profile(&db, &changes(), None).await.unwrap());
    }
}
