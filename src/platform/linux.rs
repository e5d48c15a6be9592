use super::{ActiveWindow, FocusProbe};
use log::warn;
use std::fs;
use std::path::PathBuf;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

struct Atoms {
    net_active_window: Atom,
    net_wm_name: Atom,
    net_wm_pid: Atom,
}

struct Display {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
}

/// X11 focus probe. Without a reachable X server (Wayland-only or headless
/// sessions) every sample reports the desktop.
pub struct LinuxProbe {
    display: Option<Display>,
}

impl Default for LinuxProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxProbe {
    pub fn new() -> Self {
        let display = match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let root = conn.setup().roots.get(screen_num).map(|screen| screen.root);
                match root {
                    Some(root) => intern_atoms(&conn).map(|atoms| Display { conn, root, atoms }),
                    None => {
                        warn!("Invalid X screen number {screen_num}, window tracking disabled");
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Failed to connect to X server: {e}. Window tracking disabled");
                None
            }
        };
        Self { display }
    }
}

fn intern_atoms(conn: &RustConnection) -> Option<Atoms> {
    let intern = |name: &str| -> Option<Atom> {
        conn.intern_atom(false, name.as_bytes())
            .ok()?
            .reply()
            .ok()
            .map(|r| r.atom)
    };

    let atoms = Atoms {
        net_active_window: intern("_NET_ACTIVE_WINDOW")?,
        net_wm_name: intern("_NET_WM_NAME")?,
        net_wm_pid: intern("_NET_WM_PID")?,
    };
    Some(atoms)
}

impl Display {
    fn property_string(&self, window: Window, atom: Atom) -> Option<String> {
        let reply = self
            .conn
            .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)
            .ok()?
            .reply()
            .ok()?;

        if reply.value.is_empty() {
            return None;
        }

        String::from_utf8(reply.value).ok()
    }

    fn property_u32(&self, window: Window, atom: Atom, kind: AtomEnum) -> Option<u32> {
        let reply = self
            .conn
            .get_property(false, window, atom, kind, 0, 1)
            .ok()?
            .reply()
            .ok()?;

        let mut values = reply.value32()?;
        values.next()
    }

    fn active_window_id(&self) -> Option<Window> {
        self.property_u32(self.root, self.atoms.net_active_window, AtomEnum::WINDOW)
            .filter(|&id| id != x11rb::NONE)
    }

    fn title(&self, window: Window) -> Option<String> {
        self.property_string(window, self.atoms.net_wm_name)
            .or_else(|| self.property_string(window, AtomEnum::WM_NAME.into()))
    }

    fn class_name(&self, window: Window) -> Option<String> {
        self.property_string(window, AtomEnum::WM_CLASS.into())
            .and_then(|s| s.split('\0').next().map(str::to_string))
            .filter(|s| !s.is_empty())
    }

    fn pid(&self, window: Window) -> Option<u32> {
        self.property_u32(window, self.atoms.net_wm_pid, AtomEnum::CARDINAL)
    }
}

fn process_identity(pid: u32) -> (Option<PathBuf>, Option<String>) {
    let exe = fs::read_link(format!("/proc/{pid}/exe")).ok();
    let comm = fs::read_to_string(format!("/proc/{pid}/comm"))
        .ok()
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty());
    (exe, comm)
}

impl FocusProbe for LinuxProbe {
    fn get_active_window(&self) -> ActiveWindow {
        let Some(display) = self.display.as_ref() else {
            return ActiveWindow::desktop();
        };
        let Some(window) = display.active_window_id() else {
            return ActiveWindow::desktop();
        };
        let Some(title) = display.title(window) else {
            return ActiveWindow::desktop();
        };

        let (identity_path, process_name) = match display.pid(window) {
            Some(pid) => process_identity(pid),
            None => (None, None),
        };
        let process_name = process_name.or_else(|| display.class_name(window));

        ActiveWindow::titled(&title, identity_path, process_name)
    }
}
