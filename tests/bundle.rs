//! End-to-end tests for the build orchestrator using test doubles.

mod common;

use common::{
    FakeDownloader, PAYLOAD, StaticPayload, Workspace, partial_files, runtime_contents, toolchain,
};
use std::time::Duration;
use xsea::bundler::{AssemblyStep, Bundler, Error, SEA_RESOURCE_NAME, SettingsBuilder, Toolchain};

fn injected(base: &str) -> Vec<u8> {
    let mut expected = runtime_contents(base);
    expected.extend_from_slice(SEA_RESOURCE_NAME.as_bytes());
    expected.extend_from_slice(PAYLOAD);
    expected
}

#[tokio::test]
async fn builds_one_executable_per_target() {
    let ws = Workspace::new();
    let (toolchain, _events) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["linux-x64", "win-x64"]), toolchain);

    let report = bundler.bundle().await.unwrap();

    assert!(report.is_complete());
    let linux = ws.output("linux-x64");
    let win = ws.output("win-x64.exe");
    let paths: Vec<_> = report.artifacts().map(|a| a.path.clone()).collect();
    assert_eq!(paths, [linux.clone(), win.clone()]);

    assert_eq!(
        std::fs::read(&linux).unwrap(),
        injected("node-v20.10.0-linux-x64")
    );
    assert_eq!(
        std::fs::read(&win).unwrap(),
        injected("node-v20.10.0-win-x64")
    );

    for artifact in report.artifacts() {
        assert_eq!(artifact.size, std::fs::metadata(&artifact.path).unwrap().len());
        assert_eq!(artifact.checksum.len(), 64);
    }

    // The cached runtimes stay untouched by injection.
    assert_eq!(
        std::fs::read(ws.cache_dir().join("node-v20.10.0-linux-x64")).unwrap(),
        runtime_contents("node-v20.10.0-linux-x64")
    );
}

#[tokio::test]
async fn failed_target_does_not_stop_the_others() {
    let ws = Workspace::new();
    let (toolchain, _events) = toolchain(FakeDownloader::new().offline_for("linux-arm64"));
    let bundler = Bundler::new(
        ws.build(&["linux-arm64", "linux-x64", "win-x86"]),
        toolchain,
    );

    let report = bundler.bundle().await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.outcomes().len(), 3);
    assert_eq!(report.artifacts().count(), 2);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    let (target, step, error) = failures[0];
    assert_eq!(target.to_string(), "linux-arm64");
    assert_eq!(step, AssemblyStep::Fetch);
    assert!(matches!(error, Error::Download { .. }));

    assert!(!ws.output("linux-arm64").exists());
    assert!(ws.output("linux-x64").exists());
    assert!(ws.output("win-x86.exe").exists());
}

#[tokio::test]
async fn outcomes_keep_request_order_with_parallel_jobs() {
    let ws = Workspace::new();
    let targets = ["win-arm64", "linux-s390x", "darwin-x64", "linux-ppc64le"];
    let (toolchain, _events) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.settings(&targets).jobs(4).build().unwrap(), toolchain);

    let report = bundler.bundle().await.unwrap();

    let order: Vec<String> = report
        .outcomes()
        .iter()
        .map(|o| o.target.to_string())
        .collect();
    assert_eq!(order, targets);
    assert!(report.is_complete());
}

#[tokio::test]
async fn duplicate_targets_are_built_once() {
    let ws = Workspace::new();
    let (toolchain, events) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["linux-x64", "linux-x64"]), toolchain);

    let report = bundler.bundle().await.unwrap();

    assert_eq!(report.outcomes().len(), 1);
    assert_eq!(bundler.cache().downloader().fetches(), 1);
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn darwin_arm64_is_resigned_around_injection() {
    let ws = Workspace::new();
    let (toolchain, events) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["darwin-arm64"]), toolchain);

    let report = bundler.bundle().await.unwrap();
    assert!(report.is_complete());

    assert_eq!(
        *events.lock().unwrap(),
        [
            "unsign app-darwin-arm64",
            "inject app-darwin-arm64 segment=NODE_SEA",
            "sign app-darwin-arm64",
        ]
    );
}

#[tokio::test]
async fn darwin_x64_uses_segment_without_resigning() {
    let ws = Workspace::new();
    let (toolchain, events) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["darwin-x64", "linux-arm64"]), toolchain);

    bundler.bundle().await.unwrap();

    let mut events = events.lock().unwrap().clone();
    events.sort();
    assert_eq!(
        events,
        [
            "inject app-darwin-x64 segment=NODE_SEA",
            "inject app-linux-arm64 segment=-",
        ]
    );
}

#[tokio::test]
async fn second_build_reuses_cached_runtimes() {
    let ws = Workspace::new();

    let (first, _) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["linux-x64", "win-x64"]), first);
    bundler.bundle().await.unwrap();
    assert_eq!(bundler.cache().downloader().fetches(), 2);

    let (second, _) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["linux-x64", "win-x64"]), second);
    let report = bundler.bundle().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(bundler.cache().downloader().fetches(), 0);
}

#[tokio::test]
async fn payload_failure_aborts_before_any_target() {
    let ws = Workspace::new();
    let (mut toolchain, events) = toolchain(FakeDownloader::new());
    toolchain.payload = StaticPayload::failing();
    let bundler = Bundler::new(ws.build(&["linux-x64", "win-x64"]), toolchain);

    let err = bundler.bundle().await.unwrap_err();

    assert!(matches!(err, Error::PayloadBuild(_)), "{err}");
    assert!(!err.is_per_target());
    assert_eq!(bundler.cache().downloader().fetches(), 0);
    assert!(events.lock().unwrap().is_empty());
    assert!(!ws.output("linux-x64").exists());
}

#[tokio::test]
async fn clean_without_entry_only_clears_the_cache() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.cache_dir()).unwrap();
    std::fs::write(ws.cache_dir().join("node-v20.10.0-linux-x64"), "stale").unwrap();

    let settings = SettingsBuilder::new()
        .cache_dir(ws.cache_dir())
        .clean(true)
        .build()
        .unwrap();
    let (toolchain, _) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(settings, toolchain);

    let report = bundler.bundle().await.unwrap();

    assert!(report.cache_cleared());
    assert!(report.outcomes().is_empty());
    assert!(!ws.cache_dir().exists());
}

#[tokio::test]
async fn clean_then_build_fetches_again() {
    let ws = Workspace::new();

    let (first, _) = toolchain(FakeDownloader::new());
    Bundler::new(ws.build(&["linux-x64"]), first)
        .bundle()
        .await
        .unwrap();

    let (second, _) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.settings(&["linux-x64"]).clean(true).build().unwrap(), second);
    let report = bundler.bundle().await.unwrap();

    assert!(report.cache_cleared());
    assert!(report.is_complete());
    assert_eq!(bundler.cache().downloader().fetches(), 1);
}

#[tokio::test]
async fn payload_is_built_once_for_all_targets() {
    let ws = Workspace::new();
    let (toolchain, _) = toolchain(FakeDownloader::new());
    let Toolchain {
        payload,
        downloader,
        injector,
        signer,
    } = toolchain;
    let payload = std::sync::Arc::new(payload);

    struct Shared(std::sync::Arc<StaticPayload>);
    impl xsea::bundler::PayloadGenerator for Shared {
        async fn build_payload(
            &self,
            entry: &std::path::Path,
            scratch_dir: &std::path::Path,
        ) -> xsea::bundler::Result<xsea::bundler::PayloadBlob> {
            self.0.build_payload(entry, scratch_dir).await
        }
    }

    let bundler = Bundler::new(
        ws.build(&["linux-x64", "win-x64", "darwin-arm64"]),
        Toolchain {
            payload: Shared(std::sync::Arc::clone(&payload)),
            downloader,
            injector,
            signer,
        },
    );
    bundler.bundle().await.unwrap();

    assert_eq!(payload.builds(), 1);
}

#[tokio::test]
async fn oversized_job_count_still_builds_every_target() {
    let ws = Workspace::new();
    let (toolchain, _events) = toolchain(FakeDownloader::new());
    let settings = ws
        .settings(&["linux-x64", "win-x64", "darwin-x64"])
        .jobs(usize::MAX)
        .build()
        .unwrap();
    assert_eq!(settings.jobs(), 3);

    let report = Bundler::new(settings, toolchain).bundle().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.artifacts().count(), 3);
}

#[tokio::test]
async fn cancellation_aborts_in_flight_downloads() {
    let ws = Workspace::new();
    let (toolchain, events) = toolchain(FakeDownloader::new().stalling());
    let bundler = Bundler::new(ws.build(&["linux-x64", "win-x64"]), toolchain);
    let cancel = bundler.cancellation_token();
    let cache = ws.cache_dir();

    let canceller = async {
        let mut started = false;
        for _ in 0..500 {
            if !partial_files(&cache).is_empty() {
                started = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        started
    };
    let (result, started) = tokio::join!(bundler.bundle(), canceller);

    assert!(started, "no download was in flight");
    assert!(matches!(result, Err(Error::Cancelled)), "{result:?}");
    assert_eq!(partial_files(&cache), Vec::<String>::new());
    assert!(!ws.output("linux-x64").exists());
    assert!(!ws.output("win-x64.exe").exists());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_before_start_builds_nothing() {
    let ws = Workspace::new();
    let (toolchain, _events) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["linux-x64"]), toolchain);
    bundler.cancellation_token().cancel();

    let err = bundler.bundle().await.unwrap_err();

    assert!(matches!(err, Error::Cancelled), "{err}");
    assert!(!ws.cache_dir().exists());
    assert!(!ws.output("linux-x64").exists());
}

#[test]
fn debug_output_names_the_cache_root() {
    let ws = Workspace::new();
    let (toolchain, _events) = toolchain(FakeDownloader::new());
    let bundler = Bundler::new(ws.build(&["linux-x64"]), toolchain);

    let debug = format!("{bundler:?}");

    assert!(debug.starts_with("Bundler"), "{debug}");
    assert!(debug.contains(&ws.cache_dir().display().to_string()), "{debug}");
}
