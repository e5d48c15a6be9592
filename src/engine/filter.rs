use regex::Regex;
use std::sync::OnceLock;

/// A drive-letter path (`C:\...`) or anything containing a backslash followed
/// by a path-legal character (which covers UNC `\\server\share`).
///
/// The match runs on the window title, not the process name, so an
/// application whose title merely contains such a fragment is dropped too.
const PATH_PATTERN: &str = r#"([a-zA-Z]:\\[^/:*?"<>|\r\n]+|\\[^/:*?"<>|\r\n]+)"#;

fn path_regex() -> &'static Regex {
    static PATH_REGEX: OnceLock<Regex> = OnceLock::new();
    PATH_REGEX.get_or_init(|| Regex::new(PATH_PATTERN).expect("path pattern is a valid regex"))
}

/// Returns true when a focus label looks like a raw filesystem path rather
/// than an application identity.
pub fn is_path_like(label: &str) -> bool {
    path_regex().is_match(label)
}
