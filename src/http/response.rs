//! Response building for served files.
//!
//! # Responsibilities
//! - Pick a content type from the file extension
//! - Stamp `Last-Modified` and answer conditional GETs with 304
//! - Serve single byte ranges (206/416) so downloads can resume
//! - Map handler failures to 404/500

use std::io::{self, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cache::VirtualFile;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Failures while answering a file or directory request.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("not found")]
    NotFound,

    #[error("failed to read file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read directory {}: {source}", .path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        match self {
            ServeError::NotFound => (StatusCode::NOT_FOUND, "404 page not found").into_response(),
            ServeError::Read { .. } => {
                tracing::error!(error = %self, "File read failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response()
            }
            ServeError::Listing { .. } => {
                tracing::error!(error = %self, "Directory listing failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read directory").into_response()
            }
        }
    }
}

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

fn parse_http_date(value: &str) -> Option<u64> {
    let parsed = DateTime::parse_from_rfc2822(value).ok()?;
    u64::try_from(parsed.timestamp()).ok()
}

fn unix_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

/// Content type for a file name, by extension.
pub fn content_type(file_name: &str) -> HeaderValue {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

/// Inclusive byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeRequest {
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

/// Interpret a `Range` header against a file of `len` bytes.
///
/// Only a single `bytes=` range is honored. Multiple ranges and malformed
/// values fall back to the whole file.
fn parse_range(value: &str, len: u64) -> RangeRequest {
    let Some(spec) = value.trim().strip_prefix("bytes=") else {
        return RangeRequest::Full;
    };
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeRequest::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        let Ok(suffix) = last.parse::<u64>() else {
            return RangeRequest::Full;
        };
        if suffix == 0 || len == 0 {
            return RangeRequest::Unsatisfiable;
        }
        return RangeRequest::Partial(ByteRange {
            start: len - suffix.min(len),
            end: len - 1,
        });
    }

    let Ok(start) = first.parse::<u64>() else {
        return RangeRequest::Full;
    };
    let end = if last.is_empty() {
        u64::MAX
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => end,
            _ => return RangeRequest::Full,
        }
    };

    if start >= len {
        return RangeRequest::Unsatisfiable;
    }

    RangeRequest::Partial(ByteRange {
        start,
        end: end.min(len - 1),
    })
}

/// True when the client's copy, dated by `If-Modified-Since`, is still current.
fn not_modified(request_headers: &HeaderMap, modified: Option<SystemTime>) -> bool {
    let Some(modified) = modified.and_then(unix_secs) else {
        return false;
    };

    request_headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
        .is_some_and(|since| modified <= since)
}

fn range_not_satisfiable(len: u64) -> Response {
    let mut response = StatusCode::RANGE_NOT_SATISFIABLE.into_response();
    let headers = response.headers_mut();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", len)) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    response
}

/// Serve a file view, honoring `If-Modified-Since` and a single `Range`.
pub fn file_response(mut file: VirtualFile, file_name: &str, request_headers: &HeaderMap) -> Response {
    let meta = *file.stat();
    let last_modified = meta
        .modified
        .and_then(|time| HeaderValue::from_str(&http_date(time)).ok());

    if not_modified(request_headers, meta.modified) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        if let Some(value) = last_modified {
            response.headers_mut().insert(header::LAST_MODIFIED, value);
        }
        return response;
    }

    let range = request_headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map_or(RangeRequest::Full, |v| parse_range(v, meta.len));

    let (status, body, content_range) = match range {
        RangeRequest::Unsatisfiable => return range_not_satisfiable(meta.len),
        RangeRequest::Full => (StatusCode::OK, file.into_bytes(), None),
        RangeRequest::Partial(ByteRange { start, end }) => {
            if file.seek(SeekFrom::Start(start)).is_err() {
                return range_not_satisfiable(meta.len);
            }
            let remaining = file.into_bytes();
            let take = ((end - start + 1) as usize).min(remaining.len());
            (
                StatusCode::PARTIAL_CONTENT,
                remaining.slice(..take),
                Some(format!("bytes {}-{}/{}", start, end, meta.len)),
            )
        }
    };

    let body_len = body.len() as u64;
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type(file_name));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body_len));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Some(value) = content_range.and_then(|v| HeaderValue::from_str(&v).ok()) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    if let Some(value) = last_modified {
        headers.insert(header::LAST_MODIFIED, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileMeta;
    use axum::body::Bytes;
    use std::time::Duration;

    fn file(contents: &'static [u8], modified_secs: u64) -> VirtualFile {
        VirtualFile::new(
            Bytes::from_static(contents),
            FileMeta {
                len: contents.len() as u64,
                modified: Some(UNIX_EPOCH + Duration::from_secs(modified_secs)),
                is_dir: false,
            },
        )
    }

    #[test]
    fn test_http_date_format() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(784_111_777));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type("gfx/logo.PNG"), "image/png");
        assert_eq!(content_type("sound/ambience/wind.mp3"), "audio/mpeg");
        assert_eq!(content_type("maps/readme.zzz"), "application/octet-stream");
        assert_eq!(content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_parse_range() {
        let range = |start, end| RangeRequest::Partial(ByteRange { start, end });

        assert_eq!(parse_range("bytes=6-", 11), range(6, 10));
        assert_eq!(parse_range("bytes=0-4", 11), range(0, 4));
        assert_eq!(parse_range("bytes=5-100", 11), range(5, 10));
        assert_eq!(parse_range("bytes=-3", 11), range(8, 10));
        assert_eq!(parse_range("bytes=-50", 11), range(0, 10));
        assert_eq!(parse_range("bytes=11-", 11), RangeRequest::Unsatisfiable);
        assert_eq!(parse_range("bytes=-0", 11), RangeRequest::Unsatisfiable);
        assert_eq!(parse_range("bytes=0-1,4-5", 11), RangeRequest::Full);
        assert_eq!(parse_range("bytes=5-2", 11), RangeRequest::Full);
        assert_eq!(parse_range("items=0-1", 11), RangeRequest::Full);
    }

    #[test]
    fn test_partial_content() {
        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_static("bytes=6-"));

        let response = file_response(file(b"BSP30-dust2", 784_111_777), "de_dust2.bsp", &headers);
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 6-10/11");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");

        headers.insert(header::RANGE, HeaderValue::from_static("bytes=40-"));
        let response = file_response(file(b"BSP30-dust2", 784_111_777), "de_dust2.bsp", &headers);
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */11");
    }

    #[test]
    fn test_file_response_headers() {
        let response = file_response(file(b"BSP30", 784_111_777), "de_dust2.bsp", &HeaderMap::new());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
        assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn test_conditional_get() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"),
        );

        let fresh = file_response(file(b"x", 784_111_777), "a.txt", &headers);
        assert_eq!(fresh.status(), StatusCode::NOT_MODIFIED);

        let changed = file_response(file(b"x", 784_111_800), "a.txt", &headers);
        assert_eq!(changed.status(), StatusCode::OK);
    }

    #[test]
    fn test_errors_map_to_status() {
        assert_eq!(ServeError::NotFound.into_response().status(), StatusCode::NOT_FOUND);

        let read = ServeError::Read {
            path: PathBuf::from("/tmp/x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(read.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
