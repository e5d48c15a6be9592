use crate::constants::DESKTOP_LABEL;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWindow {
    /// Title of the focused window; the key time is accumulated under.
    pub label: String,
    pub identity_path: Option<PathBuf>,
    pub process_name: Option<String>,
}

impl ActiveWindow {
    /// Sentinel for "no real foreground window" and for probe failures.
    pub fn desktop() -> Self {
        Self {
            label: DESKTOP_LABEL.to_string(),
            identity_path: None,
            process_name: Some(DESKTOP_LABEL.to_string()),
        }
    }

    /// Builds a window from a probed title, falling back to the sentinel when
    /// the title is blank.
    pub fn titled(title: &str, identity_path: Option<PathBuf>, process_name: Option<String>) -> Self {
        if title.trim().is_empty() {
            return Self::desktop();
        }
        Self {
            label: title.to_string(),
            identity_path,
            process_name,
        }
    }
}

/// Reports the currently focused window. Implementations never fail: anything
/// that cannot be resolved comes back as [`ActiveWindow::desktop`].
pub trait FocusProbe: Send {
    fn get_active_window(&self) -> ActiveWindow;
}
