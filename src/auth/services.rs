use sqlx::SqlitePool;
use tracing::{info, warn};

use super::{password::verify_dummy, repo_types::User};

/// The user behind `username` if `password` matches. An unknown name and a
/// wrong password are indistinguishable to the caller.
pub async fn authenticate(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>, sqlx::Error> {
    let Some(user) = User::find_by_username(db, username).await? else {
        verify_dummy(password);
        warn!(%username, "login unknown username");
        return Ok(None);
    };

    if !user.check_password(password) {
        warn!(%username, user_id = user.id, "login invalid password");
        return Ok(None);
    }

    info!(%username, user_id = user.id, "user logged in");
    Ok(Some(user))
}
