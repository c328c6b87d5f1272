use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::SET_COOKIE, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::cookies;

pub const FLASH_COOKIE: &str = "portfolio_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(FlashLevel::Success),
            "info" => Some(FlashLevel::Info),
            "warning" => Some(FlashLevel::Warning),
            "danger" => Some(FlashLevel::Danger),
            _ => None,
        }
    }
}

/// One-shot status message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Danger, message)
    }

    pub fn set_cookie(&self) -> String {
        cookies::build(
            FLASH_COOKIE,
            format!("{}:{}", self.level.as_str(), self.message),
            time::Duration::minutes(5),
            false,
        )
    }

    fn parse(raw: &str) -> Option<Self> {
        let (level, message) = raw.split_once(':')?;
        Some(Self::new(FlashLevel::parse(level)?, message))
    }

    /// 303 to `to`, carrying this message.
    pub fn redirect(self, to: &str) -> Response {
        (
            AppendHeaders([(SET_COOKIE, self.set_cookie())]),
            Redirect::to(to),
        )
            .into_response()
    }
}

/// Flash message left by the previous response, if any.
pub struct IncomingFlash(pub Option<Flash>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(
            cookies::find(&parts.headers, FLASH_COOKIE).and_then(|raw| Flash::parse(&raw)),
        ))
    }
}
