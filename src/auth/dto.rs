use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::forms::validate_required;

/// Login form body.
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(custom(function = "validate_required"))]
    pub password: String,
}

/// `?next=` target remembered from the admin gate.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}
