//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, plus the checks clap
//! cannot express with the exit codes xsea promises.

use crate::{
    bundler::{Settings, SettingsBuilder, Target},
    error::CliError,
};
use clap::{Parser, error::ErrorKind};
use std::{path::PathBuf, time::Duration};

/// Build Node.js single executable applications for many platforms
#[derive(Parser, Debug)]
#[command(
    name = "xsea",
    version,
    about = "Build Node.js single executable applications for many platforms",
    long_about = "Builds a single executable application (SEA) for each target from one entry point.

The matching Node.js runtime for every target is downloaded once and cached,
the application payload is generated once, and one executable is written per
target at <prefix><target>[.exe].

Usage:
  xsea app.js
  xsea -t linux-x64 -t win-x64 -t darwin-arm64 -N v20.10.0 app.js
  xsea -o dist/ app.js
  xsea --clean

Exit code 0 = build finished, even if some targets were skipped."
)]
pub struct Args {
    /// Application entry point
    #[arg(value_name = "ENTRY")]
    pub entries: Vec<PathBuf>,

    /// Hide non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Show all output
    #[arg(short = 'w', long)]
    pub verbose: bool,

    /// The output prefix
    ///
    /// Defaults to the entry point's name. A prefix ending in a letter, digit
    /// or underscore gets a `-` appended.
    #[arg(short, long, value_name = "PREFIX")]
    pub output: Option<String>,

    /// Remove cached files
    #[arg(long)]
    pub clean: bool,

    /// Keep intermediate files
    #[arg(long)]
    pub keep: bool,

    /// Node.js version to build with, e.g. v20.10.0 (default: the host's node)
    #[arg(short = 'N', long = "node", value_name = "VERSION")]
    pub node_version: Option<String>,

    /// Target(s) to build for, e.g. linux-arm64, win-x64 (default: the host)
    #[arg(short, long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Cache directory for Node.js runtimes
    #[arg(long, value_name = "DIR", env = "XSEA_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Node.js release mirror
    #[arg(long, value_name = "URL", env = "XSEA_NODE_MIRROR")]
    pub mirror: Option<String>,

    /// Number of targets built concurrently (default: number of CPUs)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Seconds before a runtime download is abandoned
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub timeout: u64,
}

impl Args {
    /// Parse command line arguments
    ///
    /// Help, version and malformed arguments come back as a [`clap::Error`]
    /// for the caller to print; see [`Args::exit_code_for`].
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Exit code for a parse that did not produce arguments. Help and version
    /// requests succeed, everything else is a usage error.
    pub fn exit_code_for(err: &clap::Error) -> i32 {
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        }
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        if self.verbose && self.quiet {
            return Err(CliError::ConflictingArguments {
                arguments: vec!["--verbose".to_string(), "--quiet".to_string()],
            });
        }

        match self.entries.len() {
            1 => {}
            0 if self.clean => {}
            _ => {
                return Err(CliError::InvalidArguments {
                    reason: "Incorrect number of positional arguments, expected 1".to_string(),
                });
            }
        }

        if self.jobs == Some(0) {
            return Err(CliError::InvalidArguments {
                reason: "--jobs must be at least 1".to_string(),
            });
        }

        if self.timeout == 0 {
            return Err(CliError::InvalidArguments {
                reason: "--timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    /// The entry point, if exactly one was given.
    pub fn entry(&self) -> Option<&PathBuf> {
        self.entries.first()
    }

    /// Converts the arguments into a build request.
    pub fn to_settings(&self) -> Result<Settings, CliError> {
        let invalid = |e: crate::bundler::Error| CliError::InvalidArguments {
            reason: e.to_string(),
        };

        let targets = self
            .targets
            .iter()
            .map(|t| t.parse::<Target>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let mut builder = SettingsBuilder::new()
            .targets(targets)
            .download_timeout(Duration::from_secs(self.timeout))
            .keep(self.keep)
            .clean(self.clean);

        if let Some(entry) = self.entry() {
            builder = builder.entry(entry);
        }
        if let Some(output) = &self.output {
            builder = builder.output(output.clone());
        }
        if let Some(version) = &self.node_version {
            builder = builder.node_version(version.clone());
        }
        if let Some(dir) = &self.cache_dir {
            builder = builder.cache_dir(dir);
        }
        if let Some(mirror) = &self.mirror {
            builder = builder.mirror(mirror.clone());
        }
        if let Some(jobs) = self.jobs {
            builder = builder.jobs(jobs);
        }

        builder.build().map_err(invalid)
    }
}

/// Runtime configuration derived from arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print indented detail line
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }

    /// Print error message, even in quiet mode
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }
}
