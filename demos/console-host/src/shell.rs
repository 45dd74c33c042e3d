//! Shell resolution for console terminals.

use std::path::{Path, PathBuf};

/// Resolve the program a terminal should run.
///
/// The search order is:
/// 1. The requested shell, as an absolute path or a name on `PATH`.
/// 2. `$SHELL` (Unix) or PowerShell (Windows).
/// 3. `sh` / `cmd.exe`.
pub fn resolve_shell(requested: Option<&Path>) -> Option<PathBuf> {
    if let Some(requested) = requested {
        return resolve_executable(requested);
    }

    if cfg!(windows) {
        which::which("powershell.exe")
            .or_else(|_| which::which("cmd.exe"))
            .ok()
    } else {
        std::env::var_os("SHELL")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute() && p.is_file())
            .or_else(|| which::which("sh").ok())
    }
}

fn resolve_executable(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }
    which::which(path).ok()
}
