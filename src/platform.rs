//! Target architecture detection and naming.
use std::fmt;
use std::str::FromStr;

use crate::error::PlatformError;

/// CPU architecture a package is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Aarch64,
}

impl Arch {
    /// Detect the architecture of the running system.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedArch`] when the architecture has
    /// no package naming convention.
    pub fn detect() -> Result<Self, PlatformError> {
        std::env::consts::ARCH.parse()
    }

    /// Architecture name as used by RPM and archive file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }

    /// Architecture name as used by Debian packages.
    #[must_use]
    pub const fn deb_name(self) -> &'static str {
        match self {
            Self::X86_64 => "amd64",
            Self::Aarch64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            other => Err(PlatformError::UnsupportedArch(other.to_string())),
        }
    }
}
