//! Build targets: an operating system family paired with an architecture.

use std::{fmt, str::FromStr};

use super::Arch;
use crate::bundler::{
    Error,
    platform::{FamilyStrategy, SigningPolicy},
};

/// Operating system family of a target.
///
/// Every family has exactly one entry in the platform strategy table, see
/// [`PlatformFamily::strategy`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PlatformFamily {
    /// `linux-*`
    Linux,
    /// `darwin-*`
    Darwin,
    /// `win-*`
    Windows,
    /// `aix-*`
    Aix,
}

impl PlatformFamily {
    /// Node.js spelling of this family.
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformFamily::Linux => "linux",
            PlatformFamily::Darwin => "darwin",
            PlatformFamily::Windows => "win",
            PlatformFamily::Aix => "aix",
        }
    }

    /// Family of the machine xsea was compiled for.
    pub fn host() -> Result<Self, Error> {
        match std::env::consts::OS {
            "linux" => Ok(PlatformFamily::Linux),
            "macos" => Ok(PlatformFamily::Darwin),
            "windows" => Ok(PlatformFamily::Windows),
            "aix" => Ok(PlatformFamily::Aix),
            other => Err(Error::InvalidTarget(format!(
                "no Node.js builds for host operating system {}",
                other
            ))),
        }
    }

    /// Extraction, naming and signing rules for this family.
    pub fn strategy(self) -> &'static FamilyStrategy {
        crate::bundler::platform::strategy(self)
    }
}

impl FromStr for PlatformFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(PlatformFamily::Linux),
            "darwin" => Ok(PlatformFamily::Darwin),
            "win" => Ok(PlatformFamily::Windows),
            "aix" => Ok(PlatformFamily::Aix),
            _ => Err(Error::InvalidTarget(format!(
                "unknown operating system '{}' (expected linux, darwin, win or aix)",
                s
            ))),
        }
    }
}

/// A `<os>-<arch>` pair such as `linux-x64` or `win-arm64`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Target {
    family: PlatformFamily,
    arch: Arch,
}

impl Target {
    /// Creates a target from its parts.
    pub fn new(family: PlatformFamily, arch: Arch) -> Self {
        Self { family, arch }
    }

    /// The target matching the machine xsea runs on.
    pub fn host() -> Result<Self, Error> {
        Ok(Self::new(PlatformFamily::host()?, Arch::host()?))
    }

    /// Operating system family.
    pub fn family(&self) -> PlatformFamily {
        self.family
    }

    /// CPU architecture.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Whether outputs for this target are Windows executables.
    pub fn is_windows(&self) -> bool {
        self.family == PlatformFamily::Windows
    }

    /// Strategy table entry for this target's family.
    pub fn strategy(&self) -> &'static FamilyStrategy {
        self.family.strategy()
    }

    /// Whether the assembled binary must be stripped and re-signed.
    pub fn requires_adhoc_signature(&self) -> bool {
        match self.strategy().signing {
            SigningPolicy::Never => false,
            SigningPolicy::AdHocOnArm64 => self.arch == Arch::Arm64,
        }
    }

    /// File name suffix of the assembled output, e.g. `linux-x64` or `win-x64.exe`.
    pub fn output_suffix(&self) -> String {
        format!("{}{}", self, self.strategy().exe_suffix)
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s.split_once('-').ok_or_else(|| {
            Error::InvalidTarget(format!("'{}' is not of the form <os>-<arch>", s))
        })?;
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.family.as_str(), self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_style_identifiers() {
        let target: Target = "win-x64".parse().unwrap();
        assert_eq!(target.family(), PlatformFamily::Windows);
        assert_eq!(target.arch(), Arch::X64);
        assert!(target.is_windows());
        assert_eq!(target.to_string(), "win-x64");
        assert_eq!(target.output_suffix(), "win-x64.exe");

        let target: Target = "linux-armv7l".parse().unwrap();
        assert_eq!(target.output_suffix(), "linux-armv7l");
    }

    #[test]
    fn rejects_malformed_identifiers() {
        assert!("linux".parse::<Target>().is_err());
        assert!("windows-x64".parse::<Target>().is_err());
        assert!("linux-mips".parse::<Target>().is_err());
        assert!("".parse::<Target>().is_err());
    }

    #[test]
    fn only_apple_silicon_is_resigned() {
        assert!("darwin-arm64".parse::<Target>().unwrap().requires_adhoc_signature());
        assert!(!"darwin-x64".parse::<Target>().unwrap().requires_adhoc_signature());
        assert!(!"linux-arm64".parse::<Target>().unwrap().requires_adhoc_signature());
        assert!(!"win-arm64".parse::<Target>().unwrap().requires_adhoc_signature());
    }

    #[test]
    fn host_target_round_trips() {
        if let Ok(host) = Target::host() {
            assert_eq!(host.to_string().parse::<Target>().unwrap(), host);
        }
    }
}
