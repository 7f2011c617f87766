//! CPU architecture types and utilities.

use std::{fmt, str::FromStr};

use crate::bundler::Error;

/// CPU architecture of a Node.js runtime build.
///
/// Spelled the way Node.js names its release archives, so
/// `Arch::X64.to_string()` is `"x64"` and `"arm64".parse()` is `Arch::Arm64`.
///
/// # Examples
///
/// ```
/// use xsea::bundler::Arch;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch, Arch::Arm64);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X64,
    /// x86 / i686 (32-bit)
    X86,
    /// AArch64 / ARM64 (64-bit) - Apple Silicon, modern ARM devices
    Arm64,
    /// ARMv7 hard-float (32-bit)
    Armv7l,
    /// POWER little endian (64-bit)
    Ppc64le,
    /// POWER big endian (64-bit) - AIX
    Ppc64,
    /// IBM Z (64-bit)
    S390x,
}

impl Arch {
    /// Node.js spelling of this architecture.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
            Arch::Armv7l => "armv7l",
            Arch::Ppc64le => "ppc64le",
            Arch::Ppc64 => "ppc64",
            Arch::S390x => "s390x",
        }
    }

    /// Architecture of the machine xsea was compiled for.
    pub fn host() -> Result<Self, Error> {
        match std::env::consts::ARCH {
            "x86_64" => Ok(Arch::X64),
            "x86" => Ok(Arch::X86),
            "aarch64" => Ok(Arch::Arm64),
            "arm" => Ok(Arch::Armv7l),
            "powerpc64" if cfg!(target_endian = "little") => Ok(Arch::Ppc64le),
            "powerpc64" => Ok(Arch::Ppc64),
            "s390x" => Ok(Arch::S390x),
            other => Err(Error::InvalidTarget(format!(
                "no Node.js builds for host architecture {}",
                other
            ))),
        }
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x64" => Ok(Arch::X64),
            "x86" => Ok(Arch::X86),
            "arm64" => Ok(Arch::Arm64),
            "armv7l" => Ok(Arch::Armv7l),
            "ppc64le" => Ok(Arch::Ppc64le),
            "ppc64" => Ok(Arch::Ppc64),
            "s390x" => Ok(Arch::S390x),
            _ => Err(Error::InvalidTarget(format!("unknown architecture '{}'", s))),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
