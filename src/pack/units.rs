//! Service-manager unit files embedded in system packages.
use anyhow::{Context as _, Result};
use minijinja::{Environment, UndefinedBehavior, context};
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE_NAME;
use crate::error::PackError;

/// Directory for unit files, relative to the package root.
pub const SYSTEMD_UNIT_DIR: &str = "usr/lib/systemd/system";

/// Launcher referenced by the unit's `ExecStart`.
const TT_SYSTEM_PATH: &str = "/usr/bin/tt";

const DEFAULT_UNIT_TEMPLATE: &str = "\
[Unit]
Description=Tarantool app {{ name }}.%i
After=network.target

[Service]
Type=simple
WorkingDirectory={{ env_path }}
ExecStart={{ tt }} -L {{ env_path }} start --foreground {{ name }}:%i
Restart=on-failure
RestartSec=2
User=tarantool
Group=tarantool

LimitCORE=infinity
# Disable OOM killer
OOMScoreAdjust=-1000
# Increase fd limit for Vinyl
LimitNOFILE=65535

# Systemd waits until all xlogs are recovered
TimeoutStartSec=86400s
# Give a reasonable amount of time to close xlogs
TimeoutStopSec=10s

[Install]
WantedBy=multi-user.target
Alias={{ name }}.%i
";

/// Render the unit for `bundle_name` installed at `env_path`.
///
/// `template` replaces the built-in unit when given. Templates can use
/// `name`, `env_path`, `tt` and `config_path`; any other variable is an error.
///
/// # Errors
///
/// Returns [`PackError::Template`] if the template is invalid.
pub fn render_unit(
    template: Option<&str>,
    bundle_name: &str,
    env_path: &Path,
) -> Result<String, PackError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);

    let env_path_str = env_path.display().to_string();
    let config_path = env_path.join(CONFIG_FILE_NAME).display().to_string();
    Ok(env.render_str(
        template.unwrap_or(DEFAULT_UNIT_TEMPLATE),
        context! {
            name => bundle_name,
            env_path => env_path_str,
            tt => TT_SYSTEM_PATH,
            config_path => config_path,
        },
    )?)
}

/// Write the unit for `bundle_name` into the package tree at `root`.
///
/// Returns the path of the written unit file.
///
/// # Errors
///
/// Returns an error if the template cannot be read or rendered, or the unit
/// cannot be written.
pub fn stage_units(
    root: &Path,
    template_file: Option<&Path>,
    bundle_name: &str,
    env_path: &Path,
) -> Result<PathBuf> {
    let custom = template_file
        .map(|p| {
            std::fs::read_to_string(p)
                .with_context(|| format!("reading unit template {}", p.display()))
        })
        .transpose()?;
    let unit = render_unit(custom.as_deref(), bundle_name, env_path)?;

    let unit_dir = root.join(SYSTEMD_UNIT_DIR);
    std::fs::create_dir_all(&unit_dir)
        .with_context(|| format!("creating directory {}", unit_dir.display()))?;
    let unit_path = unit_dir.join(format!("{bundle_name}@.service"));
    std::fs::write(&unit_path, unit)
        .with_context(|| format!("writing {}", unit_path.display()))?;
    tracing::debug!("staged service unit {}", unit_path.display());
    Ok(unit_path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_unit_references_install_path() {
        let unit = render_unit(None, "app", Path::new("/usr/share/tarantool/app")).unwrap();
        insta::assert_snapshot!(unit, @r"
        [Unit]
        Description=Tarantool app app.%i
        After=network.target

        [Service]
        Type=simple
        WorkingDirectory=/usr/share/tarantool/app
        ExecStart=/usr/bin/tt -L /usr/share/tarantool/app start --foreground app:%i
        Restart=on-failure
        RestartSec=2
        User=tarantool
        Group=tarantool

        LimitCORE=infinity
        # Disable OOM killer
        OOMScoreAdjust=-1000
        # Increase fd limit for Vinyl
        LimitNOFILE=65535

        # Systemd waits until all xlogs are recovered
        TimeoutStartSec=86400s
        # Give a reasonable amount of time to close xlogs
        TimeoutStopSec=10s

        [Install]
        WantedBy=multi-user.target
        Alias=app.%i
        ");
    }

    #[test]
    fn custom_template_gets_config_path() {
        let unit = render_unit(
            Some("ExecStart={{ tt }} -c {{ config_path }}\n"),
            "app",
            Path::new("/usr/share/tarantool/app"),
        )
        .unwrap();
        assert_eq!(
            unit,
            "ExecStart=/usr/bin/tt -c /usr/share/tarantool/app/tt.yaml\n"
        );
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let err = render_unit(Some("{{ nope }}"), "app", Path::new("/x")).unwrap_err();
        assert!(matches!(err, PackError::Template(_)));
    }

    #[test]
    fn stage_writes_templated_unit_file() {
        let root = tempfile::tempdir().unwrap();
        let template = root.path().join("unit.tmpl");
        std::fs::write(&template, "[Unit]\nDescription={{ name }}\n").unwrap();

        let path = stage_units(
            root.path(),
            Some(&template),
            "billing",
            Path::new("/usr/share/tarantool/billing"),
        )
        .unwrap();

        assert_eq!(
            path,
            root.path().join("usr/lib/systemd/system/billing@.service")
        );
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "[Unit]\nDescription=billing\n"
        );
    }

    #[test]
    fn missing_template_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let absent = root.path().join("absent.tmpl");
        assert!(stage_units(root.path(), Some(&absent), "app", Path::new("/x")).is_err());
    }
}
