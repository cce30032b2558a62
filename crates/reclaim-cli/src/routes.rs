//! Registered routes
//!
//! One table drives the `/routes` diagnostics page, the startup listing and
//! `url_for` resolution in page templates. The filter tree in [`crate::api`]
//! must stay in step with it.

/// A route exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: &'static str,
    pub method: &'static str,
    pub endpoint: &'static str,
}

pub const ROUTES: &[RouteInfo] = &[
    RouteInfo {
        path: "/static/<path:filename>",
        method: "GET",
        endpoint: "static",
    },
    RouteInfo {
        path: "/",
        method: "GET",
        endpoint: "index",
    },
    RouteInfo {
        path: "/ourai",
        method: "GET",
        endpoint: "ourai",
    },
    RouteInfo {
        path: "/about",
        method: "GET",
        endpoint: "about",
    },
    RouteInfo {
        path: "/contact",
        method: "GET",
        endpoint: "contact",
    },
    RouteInfo {
        path: "/routes",
        method: "GET",
        endpoint: "routes",
    },
    RouteInfo {
        path: "/predict",
        method: "POST",
        endpoint: "predict",
    },
    RouteInfo {
        path: "/<path:subpath>",
        method: "GET",
        endpoint: "catch_all",
    },
];

/// Build the URL for an endpoint. `static` needs a filename; endpoints with
/// other path parameters cannot be built.
pub fn url_for(endpoint: &str, filename: Option<&str>) -> Option<String> {
    let route = ROUTES.iter().find(|r| r.endpoint == endpoint)?;
    match (route.endpoint, filename) {
        ("static", Some(file)) => Some(format!("/static/{}", file.trim_start_matches('/'))),
        (_, None) if !route.path.contains('<') => Some(route.path.to_string()),
        _ => None,
    }
}

/// HTML index of every registered route, one link per route.
pub fn routes_page() -> String {
    let links: String = ROUTES
        .iter()
        .map(|r| {
            let path = escape_html(r.path);
            format!(r#"<li><a href="{path}">{path}</a> <small>{}</small></li>"#, r.method)
        })
        .collect();
    format!("<h3>Registered routes</h3><ul>{links}</ul><p>Open / or /ourai.</p>")
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
