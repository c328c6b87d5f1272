use lazy_static::lazy_static;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref YOUTUBE_WATCH_RE: Regex =
        Regex::new(r"https?://(?:www\.)?youtube\.com/watch\?v=([A-Za-z0-9_-]+)").unwrap();
}

/// HTML built from admin-authored content. Templates render it unescaped, so
/// it must never be constructed from visitor input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

#[cfg(test)]
impl TrustedHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Markdown to HTML, with YouTube watch links turned into embedded players.
pub fn render_content(markdown: &str) -> TrustedHtml {
    if markdown.trim().is_empty() {
        return TrustedHtml::default();
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    TrustedHtml(embed_youtube(&out))
}

fn youtube_iframe(video_id: &str) -> String {
    format!(
        r#"<iframe class="video-embed" width="560" height="315" src="https://www.youtube.com/embed/{video_id}" title="YouTube video player" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#
    )
}

/// True when the end of `prefix` sits between an `<a ...>` and its `</a>`.
fn inside_anchor(prefix: &str) -> bool {
    let open = [prefix.rfind("<a "), prefix.rfind("<a>")].into_iter().flatten().max();
    match (open, prefix.rfind("</a>")) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Replaces watch URLs in text position. A URL right after a quote is an
/// attribute value (a markdown link's `href`) and one inside anchor text
/// belongs to the link; both stay as they are.
pub fn embed_youtube(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for caps in YOUTUBE_WATCH_RE.captures_iter(html) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let prefix = &html[..whole.start()];
        if prefix.ends_with(|c: char| c == '"' || c == '\'') || inside_anchor(prefix) {
            continue;
        }
        out.push_str(&html[last..whole.start()]);
        out.push_str(&youtube_iframe(id.as_str()));
        last = whole.end();
    }
    out.push_str(&html[last..]);
    out
}
