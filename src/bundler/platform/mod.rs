//! Per-family platform rules.
//!
//! Every [`PlatformFamily`] maps to one [`FamilyStrategy`] entry describing how
//! its runtime archive is packed, how its executables are named, which
//! injection options it needs and whether assembled binaries must be
//! re-signed. Adding a platform means adding a table entry.

use crate::bundler::settings::PlatformFamily;

/// Container format of a Node.js release archive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArchiveKind {
    /// `.tar.gz`, executable at `<root>/bin/node`
    TarGz,
    /// `.zip`, executable at `<root>/node.exe`
    Zip,
}

impl ArchiveKind {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::Zip => "zip",
        }
    }

    /// Path of the runtime executable inside an archive rooted at `archive_base`.
    pub fn executable_entry(self, archive_base: &str) -> String {
        match self {
            ArchiveKind::TarGz => format!("{}/bin/node", archive_base),
            ArchiveKind::Zip => format!("{}/node.exe", archive_base),
        }
    }
}

/// When an assembled binary needs an ad-hoc code signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SigningPolicy {
    /// Never touch signatures.
    Never,
    /// Strip before injection and re-sign after, on arm64 only.
    AdHocOnArm64,
}

/// Rules for one operating system family.
#[derive(Debug)]
pub struct FamilyStrategy {
    /// Family this entry describes.
    pub family: PlatformFamily,
    /// Archive format of the runtime release.
    pub archive: ArchiveKind,
    /// Suffix appended to assembled executables.
    pub exe_suffix: &'static str,
    /// Mach-O segment the payload goes into, if the format has segments.
    pub macho_segment: Option<&'static str>,
    /// Code signing requirements.
    pub signing: SigningPolicy,
}

static STRATEGIES: [FamilyStrategy; 4] = [
    FamilyStrategy {
        family: PlatformFamily::Linux,
        archive: ArchiveKind::TarGz,
        exe_suffix: "",
        macho_segment: None,
        signing: SigningPolicy::Never,
    },
    FamilyStrategy {
        family: PlatformFamily::Darwin,
        archive: ArchiveKind::TarGz,
        exe_suffix: "",
        macho_segment: Some("NODE_SEA"),
        signing: SigningPolicy::AdHocOnArm64,
    },
    FamilyStrategy {
        family: PlatformFamily::Windows,
        archive: ArchiveKind::Zip,
        exe_suffix: ".exe",
        macho_segment: None,
        signing: SigningPolicy::Never,
    },
    FamilyStrategy {
        family: PlatformFamily::Aix,
        archive: ArchiveKind::TarGz,
        exe_suffix: "",
        macho_segment: None,
        signing: SigningPolicy::Never,
    },
];

/// Looks up the strategy table entry for `family`.
pub fn strategy(family: PlatformFamily) -> &'static FamilyStrategy {
    match family {
        PlatformFamily::Linux => &STRATEGIES[0],
        PlatformFamily::Darwin => &STRATEGIES[1],
        PlatformFamily::Windows => &STRATEGIES[2],
        PlatformFamily::Aix => &STRATEGIES[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_entries_match_their_family() {
        for family in [
            PlatformFamily::Linux,
            PlatformFamily::Darwin,
            PlatformFamily::Windows,
            PlatformFamily::Aix,
        ] {
            assert_eq!(strategy(family).family, family);
        }
    }

    #[test]
    fn executable_entries() {
        let base = "node-v20.10.0-win-x64";
        assert_eq!(
            ArchiveKind::Zip.executable_entry(base),
            "node-v20.10.0-win-x64/node.exe"
        );
        assert_eq!(
            ArchiveKind::TarGz.executable_entry("node-v20.10.0-linux-x64"),
            "node-v20.10.0-linux-x64/bin/node"
        );
    }
}
