pub mod types;

pub use types::{ActiveWindow, FocusProbe};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::LinuxProbe as NativeProbe;

/// Fallback for platforms without a native probe: always reports the desktop.
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Default)]
pub struct NativeProbe;

#[cfg(not(target_os = "linux"))]
impl NativeProbe {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "linux"))]
impl FocusProbe for NativeProbe {
    fn get_active_window(&self) -> ActiveWindow {
        ActiveWindow::desktop()
    }
}
