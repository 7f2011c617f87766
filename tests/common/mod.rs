//! Shared fixtures and test doubles for the integration tests.
//!
//! Runtime archives are built in memory with the same layout as Node.js
//! release archives; the doubles stand in for the network, `node`,
//! `postject` and `codesign`.

#![allow(dead_code)]

use flate2::{Compression, write::GzEncoder};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use xsea::bundler::{
    CodeSigner, Downloader, Error, InjectOptions, Injector, PayloadBlob, PayloadGenerator, Result,
    Settings, SettingsBuilder, Target, Toolchain,
};

pub const VERSION: &str = "v20.10.0";
pub const PAYLOAD: &[u8] = b"console.log('hello from sea')";

/// Contents of the fake runtime executable inside an archive named `base`.
pub fn runtime_contents(base: &str) -> Vec<u8> {
    format!("RUNTIME {} NODE_SEA_FUSE:0\n", base).into_bytes()
}

/// A `.tar.gz` release archive; `bin/node` is left out unless `with_executable`.
pub fn tar_gz_archive(base: &str, with_executable: bool) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));

    let mut append = |path: String, data: &[u8], mode: u32| {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    };

    append(format!("{}/README.md", base), b"Node.js", 0o644);
    if with_executable {
        append(format!("{}/bin/node", base), &runtime_contents(base), 0o755);
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// A `.zip` release archive; `node.exe` is left out unless `with_executable`.
pub fn zip_archive(base: &str, with_executable: bool) -> Vec<u8> {
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer
        .start_file(format!("{}/README.md", base), options)
        .unwrap();
    writer.write_all(b"Node.js").unwrap();
    if with_executable {
        writer
            .start_file(format!("{}/node.exe", base), options)
            .unwrap();
        writer.write_all(&runtime_contents(base)).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// Serves release archives synthesized from the requested file name and counts
/// fetches.
#[derive(Debug, Default)]
pub struct FakeDownloader {
    fetches: AtomicUsize,
    offline_targets: Vec<String>,
    without_executable: bool,
    stalling: bool,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a network failure for every archive of `target`.
    pub fn offline_for(mut self, target: &str) -> Self {
        self.offline_targets.push(target.to_string());
        self
    }

    /// Serves archives that lack the runtime executable.
    pub fn without_executable(mut self) -> Self {
        self.without_executable = true;
        self
    }

    /// Writes the first bytes of every archive and then never finishes.
    pub fn stalling(mut self) -> Self {
        self.stalling = true;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let file = url.rsplit('/').next().unwrap_or_default();
        if self
            .offline_targets
            .iter()
            .any(|t| file.contains(&format!("-{}.", t)))
        {
            return Err(Error::Download {
                url: url.to_string(),
                reason: "simulated network failure".to_string(),
            });
        }

        let with_executable = !self.without_executable;
        let data = if let Some(base) = file.strip_suffix(".tar.gz") {
            tar_gz_archive(base, with_executable)
        } else if let Some(base) = file.strip_suffix(".zip") {
            zip_archive(base, with_executable)
        } else {
            return Err(Error::Download {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            });
        };

        if self.stalling {
            tokio::fs::write(dest, &data[..data.len() / 2]).await?;
            std::future::pending::<()>().await;
        }

        tokio::fs::write(dest, data).await?;
        Ok(())
    }
}

/// Returns a fixed payload and counts how often it was asked for one.
#[derive(Debug, Default)]
pub struct StaticPayload {
    builds: AtomicUsize,
    fail: bool,
}

impl StaticPayload {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl PayloadGenerator for StaticPayload {
    async fn build_payload(&self, entry: &Path, _scratch_dir: &Path) -> Result<PayloadBlob> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::PayloadBuild(format!(
                "could not build {}",
                entry.display()
            )));
        }
        Ok(PayloadBlob::new(PAYLOAD))
    }
}

/// Ordered record of the tool invocations of one build.
pub type EventLog = Arc<Mutex<Vec<String>>>;

fn record(log: &EventLog, event: String) {
    log.lock().unwrap().push(event);
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Appends the resource name and payload to the binary, refusing binaries
/// without the sentinel fuse.
#[derive(Debug, Default, Clone)]
pub struct RecordingInjector {
    pub events: EventLog,
}

impl Injector for RecordingInjector {
    async fn inject_payload(
        &self,
        binary: &Path,
        resource_name: &str,
        payload: &[u8],
        options: &InjectOptions,
    ) -> Result<()> {
        let mut data = tokio::fs::read(binary).await?;
        if !data.windows(13).any(|w| w == b"NODE_SEA_FUSE") {
            return Err(Error::Injection {
                path: binary.to_path_buf(),
                reason: "sentinel fuse not found".to_string(),
            });
        }
        data.extend_from_slice(resource_name.as_bytes());
        data.extend_from_slice(payload);
        tokio::fs::write(binary, data).await?;

        record(
            &self.events,
            format!(
                "inject {} segment={}",
                file_name(binary),
                options.macho_segment_name.unwrap_or("-")
            ),
        );
        Ok(())
    }
}

/// Records signature removal and ad-hoc signing without touching the file.
#[derive(Debug, Default, Clone)]
pub struct RecordingSigner {
    pub events: EventLog,
}

impl CodeSigner for RecordingSigner {
    async fn remove_signature(&self, binary: &Path) -> Result<()> {
        record(&self.events, format!("unsign {}", file_name(binary)));
        Ok(())
    }

    async fn sign_adhoc(&self, binary: &Path) -> Result<()> {
        record(&self.events, format!("sign {}", file_name(binary)));
        Ok(())
    }
}

pub type TestToolchain = Toolchain<StaticPayload, FakeDownloader, RecordingInjector, RecordingSigner>;

/// A toolchain of doubles whose injector and signer share one event log.
pub fn toolchain(downloader: FakeDownloader) -> (TestToolchain, EventLog) {
    let events = EventLog::default();
    let toolchain = Toolchain {
        payload: StaticPayload::default(),
        downloader,
        injector: RecordingInjector {
            events: Arc::clone(&events),
        },
        signer: RecordingSigner {
            events: Arc::clone(&events),
        },
    };
    (toolchain, events)
}

/// A workspace with an entry point, a cache root and an output prefix.
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();
        Self { dir }
    }

    pub fn entry(&self) -> PathBuf {
        self.dir.path().join("app.js")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    /// Output prefix `<dir>/dist/app`, which becomes `<dir>/dist/app-`.
    pub fn prefix(&self) -> String {
        self.dir.path().join("dist").join("app").display().to_string()
    }

    pub fn output(&self, target: &str) -> PathBuf {
        PathBuf::from(format!("{}-{}", self.prefix(), target))
    }

    pub fn settings(&self, targets: &[&str]) -> SettingsBuilder {
        SettingsBuilder::new()
            .entry(self.entry())
            .output(self.prefix())
            .node_version(VERSION)
            .cache_dir(self.cache_dir())
            .targets(parse_targets(targets))
    }

    pub fn build(&self, targets: &[&str]) -> Settings {
        self.settings(targets).build().unwrap()
    }
}

pub fn parse_targets(targets: &[&str]) -> Vec<Target> {
    targets.iter().map(|t| t.parse().unwrap()).collect()
}

/// Names of the partially written files directly under `dir`.
pub fn partial_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".tmp"))
                .collect()
        })
        .unwrap_or_default()
}
