//! Deterministic package file names.
use crate::platform::Arch;

/// Build a package name from its parts.
///
/// With `versioned` the name is `<app>-<version><suffix>`, otherwise
/// `<app><suffix>`.
#[must_use]
pub fn package_name(app: &str, version: &str, suffix: &str, versioned: bool) -> String {
    if versioned {
        format!("{app}-{version}{suffix}")
    } else {
        format!("{app}{suffix}")
    }
}

/// RPM file suffix, e.g. `-1.x86_64.rpm`.
#[must_use]
pub fn rpm_suffix(arch: Arch) -> String {
    format!("-1.{}.rpm", arch.as_str())
}

/// Debian package suffix, e.g. `-1_amd64.deb`.
#[must_use]
pub fn deb_suffix(arch: Arch) -> String {
    format!("-1_{}.deb", arch.deb_name())
}

/// Compressed tarball suffix, e.g. `.x86_64.tar.gz`.
#[must_use]
pub fn tgz_suffix(arch: Arch) -> String {
    format!(".{}.tar.gz", arch.as_str())
}
