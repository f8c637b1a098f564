//! Recognition of single-application directories.
use std::path::Path;

/// Files whose presence marks a directory as an application.
const APP_MARKERS: [&str; 2] = ["init.lua", "instances.yml"];

/// Return `true` if `path` is an application: a directory holding a regular
/// `init.lua` or `instances.yml`, or a `.lua` script itself.
#[must_use]
pub fn is_app(path: &Path) -> bool {
    if path.is_dir() {
        return APP_MARKERS.iter().any(|m| path.join(m).is_file());
    }
    path.is_file() && path.extension().is_some_and(|ext| ext == "lua")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn directory_with_init_lua_is_app() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("init.lua"), "").unwrap();
        assert!(is_app(dir.path()));
    }

    #[test]
    fn directory_with_instances_yml_is_app() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("instances.yml"), "").unwrap();
        assert!(is_app(dir.path()));
    }

    #[test]
    fn marker_directory_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("init.lua")).unwrap();
        assert!(!is_app(dir.path()));
    }

    #[test]
    fn empty_directory_is_not_app() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_app(dir.path()));
    }

    #[test]
    fn lua_script_is_app() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("app.lua");
        std::fs::write(&script, "").unwrap();
        assert!(is_app(&script));
        assert!(!is_app(&dir.path().join("missing.lua")));
    }
}
