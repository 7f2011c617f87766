//! External tool detection and availability checking.
//!
//! Locates the external programs the build pipeline drives: `node` (payload
//! generation, default runtime version), `postject` (injection) and
//! `codesign` (macOS signatures). Lookups are cached for the process lifetime.

use crate::bundler::error::{Error, Result};
use std::{fmt, path::PathBuf, sync::LazyLock};

/// A program plus the arguments that precede the caller's own.
#[derive(Clone, Debug)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub leading_args: Vec<&'static str>,
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.leading_args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

static NODE: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("node"));

static CODESIGN: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("codesign"));

/// `postject` on PATH, otherwise `npx --yes postject`.
static POSTJECT: LazyLock<Option<ToolCommand>> = LazyLock::new(|| {
    if let Some(program) = locate("postject") {
        return Some(ToolCommand {
            program,
            leading_args: vec![],
        });
    }
    locate("npx").map(|program| {
        log::debug!("postject not on PATH, falling back to npx");
        ToolCommand {
            program,
            leading_args: vec!["--yes", "postject"],
        }
    })
});

fn locate(name: &str) -> Option<PathBuf> {
    match which::which(name) {
        Ok(path) => {
            log::debug!("Found {} at: {}", name, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", name, e);
            None
        }
    }
}

/// Path of the host's `node`.
pub fn node() -> Result<PathBuf> {
    NODE.clone().ok_or_else(|| {
        Error::GenericError("node not found. Please install Node.js 20 or newer".into())
    })
}

/// Command that runs postject.
pub fn postject() -> Result<ToolCommand> {
    POSTJECT.clone().ok_or_else(|| {
        Error::GenericError(
            "postject not found. Install it with `npm install -g postject` or make npx available"
                .into(),
        )
    })
}

/// Path of the macOS `codesign` tool.
pub fn codesign() -> Result<PathBuf> {
    CODESIGN.clone().ok_or_else(|| {
        Error::GenericError("codesign not found. Signing requires macOS developer tools".into())
    })
}

/// Version of the host's `node`, e.g. `v20.10.0`.
pub async fn node_version() -> Result<String> {
    let node = node()?;
    let output = tokio::process::Command::new(&node)
        .arg("--version")
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::CommandFailed {
            command: format!("{} --version", node.display()),
            error: e,
        })?;

    if !output.status.success() {
        return Err(Error::GenericError(format!(
            "{} --version exited with {}",
            node.display(),
            output.status
        )));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        return Err(Error::GenericError(format!(
            "{} --version printed nothing",
            node.display()
        )));
    }
    log::debug!("Host node version: {}", version);
    Ok(version)
}
