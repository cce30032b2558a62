//! Marketing pages
//!
//! Pages are HTML templates read from the templates directory on every
//! request. Rendering supports one kind of expression:
//!
//! ```text
//! {{ url_for('about') }}                              -> /about
//! {{ url_for('static', filename='css/site.css') }}    -> /static/css/site.css
//! ```
//!
//! `{# ... #}` comments are removed. Anything else inside `{{ }}` or
//! `{% %}` is a render error.
//!
//! Render policy: when a page exists but cannot be rendered, its raw bytes
//! are served unchanged and the error is logged at warn. A page that does not
//! exist is a 404.

use crate::routes;
use crate::security::{is_suspicious_path, validate_path};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use warp::http::{header, StatusCode};
use warp::Reply;

/// Body of the 404 response for a missing page.
pub const NOT_FOUND_BODY: &str = "Template not found on server";

pub const HOME_PAGE: &str = "index.html";

/// Template behind each named page route.
pub const PAGES: &[(&str, &str)] = &[
    ("index", HOME_PAGE),
    ("ourai", "ourai.html"),
    ("about", "about.html"),
    ("contact", "contact.html"),
];

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("unterminated tag starting at byte {0}")]
    Unterminated(usize),

    #[error("unsupported template expression: {0}")]
    Unsupported(String),

    #[error("could not build url for endpoint '{0}'")]
    UnknownEndpoint(String),
}

/// Outcome of looking up a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Rendered(String),
    Raw(Vec<u8>),
    NotFound,
}

impl Reply for Page {
    fn into_response(self) -> warp::reply::Response {
        match self {
            Page::Rendered(html) => warp::reply::html(html).into_response(),
            Page::Raw(bytes) => {
                warp::reply::with_header(bytes, header::CONTENT_TYPE, "text/html; charset=utf-8")
                    .into_response()
            }
            Page::NotFound => {
                warp::reply::with_status(NOT_FOUND_BODY, StatusCode::NOT_FOUND).into_response()
            }
        }
    }
}

/// Reads and renders templates from one directory.
#[derive(Debug, Clone)]
pub struct PageStore {
    templates_dir: PathBuf,
}

impl PageStore {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Path of an existing template inside the templates directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || is_suspicious_path(name) {
            return None;
        }
        validate_path(name, &self.templates_dir)
            .ok()
            .filter(|p| p.is_file())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Look up and render a page.
    pub async fn fetch(&self, name: &str) -> Page {
        let Some(path) = self.resolve(name) else {
            debug!(page = name, "Template not found");
            return Page::NotFound;
        };
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(page = name, error = %e, "Failed to read template");
                return Page::NotFound;
            }
        };
        match render_template(bytes.clone()) {
            Ok(html) => Page::Rendered(html),
            Err(e) => {
                warn!(page = name, error = %e, "Template render failed, sending raw file");
                Page::Raw(bytes)
            }
        }
    }

    /// Names of the `.html` files at the top of the templates directory.
    pub fn list_templates(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.templates_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| n.ends_with(".html"))
            .collect();
        names.sort();
        names
    }
}

/// Expand template expressions in `source`.
pub fn render_template(source: Vec<u8>) -> Result<String, RenderError> {
    let text = String::from_utf8(source)?;
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    let mut offset = 0;

    while let Some(start) = rest.find('{') {
        let (close, is_expr) = match rest[start..].get(..2) {
            Some("{{") => ("}}", true),
            Some("{%") => ("%}", false),
            Some("{#") => ("#}", false),
            _ => {
                out.push_str(&rest[..=start]);
                offset += start + 1;
                rest = &rest[start + 1..];
                continue;
            }
        };
        out.push_str(&rest[..start]);

        let body_start = start + 2;
        let end = rest[body_start..]
            .find(close)
            .ok_or(RenderError::Unterminated(offset + start))?;
        let inner = rest[body_start..body_start + end].trim();

        match (is_expr, close) {
            (true, _) => out.push_str(&eval_expression(inner)?),
            (false, "#}") => {}
            _ => return Err(RenderError::Unsupported(format!("{{% {inner} %}}"))),
        }

        let consumed = body_start + end + close.len();
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

fn eval_expression(expr: &str) -> Result<String, RenderError> {
    let unsupported = || RenderError::Unsupported(expr.to_string());

    let args = expr
        .strip_prefix("url_for(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(unsupported)?;

    let mut parts = split_args(args).into_iter();
    let endpoint = parts
        .next()
        .and_then(|a| unquote(&a))
        .ok_or_else(unsupported)?;

    let mut filename = None;
    for arg in parts {
        let (key, value) = arg.split_once('=').ok_or_else(unsupported)?;
        match (key.trim(), unquote(value)) {
            ("filename", Some(v)) => filename = Some(v),
            _ => return Err(unsupported()),
        }
    }

    routes::url_for(&endpoint, filename.as_deref())
        .map(|url| routes::escape_html(&url))
        .ok_or(RenderError::UnknownEndpoint(endpoint))
}

/// Split call arguments on commas that are not inside quotes.
fn split_args(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in args.chars() {
        match (quote, c) {
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (None, ',') => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

fn unquote(s: &str) -> Option<String> {
    let s = s.trim();
    let first = s.chars().next()?;
    if (first == '\'' || first == '"') && s.len() >= 2 && s.ends_with(first) {
        Some(s[1..s.len() - 1].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn render(s: &str) -> Result<String, RenderError> {
        render_template(s.as_bytes().to_vec())
    }

    #[test]
    fn test_render_plain_html() {
        let html = "<html><body><p>Hello {world}</p></body></html>";
        assert_eq!(render(html).unwrap(), html);
    }

    #[test]
    fn test_render_url_for_endpoint() {
        assert_eq!(
            render(r#"<a href="{{ url_for('about') }}">About</a>"#).unwrap(),
            r#"<a href="/about">About</a>"#
        );
    }

    #[test]
    fn test_render_url_for_static() {
        assert_eq!(
            render(r#"<link href="{{url_for("static", filename="css/site.css")}}">"#).unwrap(),
            r#"<link href="/static/css/site.css">"#
        );
    }

    #[test]
    fn test_render_strips_comments() {
        assert_eq!(render("a{# note #}b").unwrap(), "ab");
    }

    #[test]
    fn test_render_errors() {
        assert!(matches!(
            render("{{ url_for('pricing') }}"),
            Err(RenderError::UnknownEndpoint(e)) if e == "pricing"
        ));
        assert!(matches!(render("{{ user.name }}"), Err(RenderError::Unsupported(_))));
        assert!(matches!(render("{% block body %}"), Err(RenderError::Unsupported(_))));
        assert!(matches!(render("ok {{ url_for('about')"), Err(RenderError::Unterminated(3))));
        assert!(matches!(
            render_template(vec![0xff, 0xfe]),
            Err(RenderError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_split_args_respects_quotes() {
        assert_eq!(
            split_args("'static', filename='a,b.css'"),
            vec!["'static'".to_string(), " filename='a,b.css'".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_rendered_raw_and_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<a href=\"{{ url_for('contact') }}\">",
        )
        .unwrap();
        std::fs::write(dir.path().join("about.html"), "{% extends 'base.html' %}").unwrap();
        let store = PageStore::new(dir.path());

        assert_eq!(
            store.fetch("index.html").await,
            Page::Rendered("<a href=\"/contact\">".into())
        );
        assert_eq!(
            store.fetch("about.html").await,
            Page::Raw(b"{% extends 'base.html' %}".to_vec())
        );
        assert_eq!(store.fetch("contact.html").await, Page::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_refuses_escape() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir(&templates).unwrap();
        std::fs::write(dir.path().join("secret.html"), "secret").unwrap();
        let store = PageStore::new(&templates);

        assert_eq!(store.fetch("../secret.html").await, Page::NotFound);
        assert!(!store.exists("../secret.html"));
    }

    #[test]
    fn test_list_templates() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.html"), "").unwrap();
        std::fs::write(dir.path().join("a.html"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        let store = PageStore::new(dir.path());
        assert_eq!(store.list_templates(), vec!["a.html", "b.html"]);
        assert!(PageStore::new("/nonexistent/templates").list_templates().is_empty());
    }
}
