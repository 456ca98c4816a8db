//! Lexical request path normalization.

/// Clean a decoded request path into an absolute, slash-separated form.
///
/// Empty segments and `.` are dropped and `..` pops the previous segment,
/// never climbing above the root. The result always starts with `/` and
/// never ends with one, except for the root itself.
pub fn normalize_request_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Join a directory key and a child name into a request key.
pub fn child_key(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_dots_and_separators() {
        assert_eq!(normalize_request_path("/maps//./de_dust2.bsp"), "/maps/de_dust2.bsp");
        assert_eq!(normalize_request_path("maps/../sound/x.wav"), "/sound/x.wav");
        assert_eq!(normalize_request_path("/maps/"), "/maps");
        assert_eq!(normalize_request_path(""), "/");
    }

    #[test]
    fn test_never_escapes_root() {
        assert_eq!(normalize_request_path("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(normalize_request_path("a/../../server.cfg"), "/server.cfg");
        assert_eq!(normalize_request_path("/.."), "/");
    }

    #[test]
    fn test_child_key() {
        assert_eq!(child_key("/", "maps"), "/maps");
        assert_eq!(child_key("/maps", "a.bsp"), "/maps/a.bsp");
    }
}
