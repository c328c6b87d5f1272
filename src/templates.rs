use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use lazy_static::lazy_static;
use serde::Serialize;
use tera::{Context, Tera};

use crate::{
    auth::{extractors::CurrentSession, repo_types::User},
    cookies,
    error::AppError,
    flash::{Flash, IncomingFlash, FLASH_COOKIE},
};

lazy_static! {
    pub static ref TEMPLATES: Tera =
        build_templates().expect("embedded templates must parse");
}

pub fn build_templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("index.html", include_str!("../templates/index.html")),
        ("about.html", include_str!("../templates/about.html")),
        ("project.html", include_str!("../templates/project.html")),
        ("login.html", include_str!("../templates/login.html")),
        ("404.html", include_str!("../templates/404.html")),
        ("admin/dashboard.html", include_str!("../templates/admin/dashboard.html")),
        ("admin/edit_profile.html", include_str!("../templates/admin/edit_profile.html")),
        ("admin/project_form.html", include_str!("../templates/admin/project_form.html")),
    ])?;
    Ok(tera)
}

/// Context shared by every page: site owner, login state and flashes.
pub struct PageContext {
    ctx: Context,
    flashes: Vec<Flash>,
    consumed_flash: bool,
}

impl PageContext {
    pub fn new(user: Option<&User>, session: &CurrentSession, flash: IncomingFlash) -> Self {
        let mut ctx = Context::new();
        ctx.insert("user", &user);
        ctx.insert("logged_in", &session.is_authenticated());
        let consumed_flash = flash.0.is_some();
        Self {
            ctx,
            flashes: flash.0.into_iter().collect(),
            consumed_flash,
        }
    }

    pub fn insert<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        self.ctx.insert(key, value);
    }

    /// Message shown on this very page rather than after a redirect.
    pub fn flash_now(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    pub fn render(mut self, template: &str) -> Result<Page, AppError> {
        self.ctx.insert("flashes", &self.flashes);
        let html = TEMPLATES.render(template, &self.ctx)?;
        Ok(Page {
            html,
            clear_flash: self.consumed_flash,
        })
    }
}

/// Rendered HTML page; drops the flash cookie once its message was shown.
pub struct Page {
    html: String,
    clear_flash: bool,
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        if self.clear_flash {
            (
                AppendHeaders([(SET_COOKIE, cookies::removal(FLASH_COOKIE))]),
                Html(self.html),
            )
                .into_response()
        } else {
            Html(self.html).into_response()
        }
    }
}

pub fn render_error(status: StatusCode, message: &str) -> tera::Result<String> {
    let mut ctx = Context::new();
    ctx.insert("user", &Option::<User>::None);
    ctx.insert("logged_in", &false);
    ctx.insert("flashes", &Vec::<Flash>::new());
    ctx.insert("status", &status.as_u16());
    ctx.insert("message", message);
    TEMPLATES.render("404.html", &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::render_content;

    #[test]
    fn embedded_templates_parse() {
        let tera = build_templates().unwrap();
        let names: Vec<_> = tera.get_template_names().collect();
        assert!(names.contains(&"admin/project_form.html"));
    }

    #[test]
    fn error_page_shows_status_and_message() {
        let html = render_error(StatusCode::NOT_FOUND, "Page not found").unwrap();
        assert!(html.contains("404"));
        assert!(html.contains("Page not found"));
    }

    #[test]
    fn trusted_html_is_not_escaped_but_plain_text_is() {
        let mut user = User::new_admin("admin", "admin@example.com");
        user.display_name = "<script>x</script>".into();
        user.about_text = "# About\n\nhttps://www.youtube.com/watch?v=abc".into();

        let mut page = PageContext::new(Some(&user), &CurrentSession(None), IncomingFlash(None));
        page.insert("about_html", &render_content(&user.about_text));
        let html = page.render("about.html").unwrap().html;

        assert!(html.contains("<h1>About</h1>"));
        assert!(html.contains(r#"src="https://www.youtube.com/embed/abc""#));
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn consumed_flash_is_cleared() {
        let flash = IncomingFlash(Some(Flash::success("Saved")));
        let page = PageContext::new(None, &CurrentSession(None), flash)
            .render("about.html")
            .unwrap();
        assert!(page.html.contains("Saved"));
        let res = page.into_response();
        let cookie = res.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("portfolio_flash="));
        assert!(cookie.contains("Max-Age=0"));
    }
}
