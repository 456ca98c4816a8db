//! HTML directory listings (auto-index).

use std::fmt::Write as _;
use std::path::Path;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::path::child_key;
use crate::http::response::ServeError;
use crate::http::server::AppState;

/// Render a listing of `fs_path`, filtered through the access engine.
///
/// `key` is the normalized request path, `raw_path` the path as sent by the
/// client, used for the trailing-slash redirect.
pub async fn list_directory(
    state: &AppState,
    key: &str,
    raw_path: &str,
    fs_path: &Path,
) -> Result<Response, ServeError> {
    if !state.auto_index {
        return Err(ServeError::NotFound);
    }

    if !state.access.path_allowed(key) {
        tracing::debug!(path = %key, "Directory access denied");
        return Err(ServeError::NotFound);
    }

    if !raw_path.ends_with('/') {
        let location = trailing_slash_location(raw_path);
        return Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response());
    }

    let listing_error = |source| ServeError::Listing {
        path: fs_path.to_path_buf(),
        source,
    };

    let mut dir = tokio::fs::read_dir(fs_path).await.map_err(listing_error)?;
    let mut items = Vec::new();

    while let Some(entry) = dir.next_entry().await.map_err(listing_error)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let entry_key = child_key(key, &name);
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);

        if is_dir {
            if state.access.path_allowed(&entry_key) {
                items.push(format!("{}/", name));
            }
        } else if state.access.file_allowed(&entry_key) {
            items.push(name);
        }
    }

    items.sort();
    if key != "/" {
        items.insert(0, "../".to_string());
    }

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        render(key, &items),
    )
        .into_response())
}

/// Same-origin redirect target for a directory requested without its slash.
///
/// Leading slashes collapse to one so the location is never protocol-relative.
fn trailing_slash_location(raw_path: &str) -> String {
    format!("/{}/", raw_path.trim_start_matches('/'))
}

fn render(path: &str, items: &[String]) -> String {
    let title = escape_html(path);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Index of {title}</title></head>\n<body>\n<h1>Index of {title}</h1>\n<hr>\n<pre>\n"
    );

    for item in items {
        let _ = writeln!(
            html,
            "<a href=\"{}\">{}</a>",
            escape_html(&encode_href(item)),
            escape_html(item)
        );
    }

    html.push_str("</pre>\n<hr>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encode a relative link, keeping `/` so directories stay navigable.
fn encode_href(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}
