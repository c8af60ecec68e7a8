use async_trait::async_trait;
use setup_fargate::{
    ArtifactFetcher, DirectoryCache, PlatformDescriptor, ProvisionError, ToolCache,
    ToolProvisioner, VersionTag, TOOL_NAME,
};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};

fn release_zip() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default().unix_permissions(0o755);
    writer.start_file("fargate.exe", options).unwrap();
    writer.write_all(b"MZ fake fargate binary").unwrap();
    writer.start_file("LICENSE", options).unwrap();
    writer.write_all(b"Apache-2.0").unwrap();
    writer.finish().unwrap().into_inner()
}

/// Serves a canned release archive and counts requests. Fails every
/// request while `offline` is set.
#[derive(Default)]
struct FakeReleaseHost {
    downloads: AtomicUsize,
    offline: AtomicBool,
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl ArtifactFetcher for FakeReleaseHost {
    async fn download(&self, url: &str, local_path: &Path) -> Result<(), ProvisionError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProvisionError::download(url, "connection refused"));
        }
        fs::write(local_path, release_zip()).map_err(|e| ProvisionError::download(url, e))
    }
}

fn provisioner(
    tmp: &TempDir,
    raw_os: &str,
    raw_arch: &str,
) -> ToolProvisioner<DirectoryCache, FakeReleaseHost> {
    ToolProvisioner::new(
        PlatformDescriptor::new(raw_os, raw_arch),
        DirectoryCache::new(tmp.path().join("cache")).unwrap(),
        FakeReleaseHost::default(),
        tmp.path().join("tmp"),
    )
}

#[tokio::test]
async fn test_windows_end_to_end() {
    let tmp = tempdir().unwrap();
    let provisioner = provisioner(&tmp, "win32", "x64");
    let version = VersionTag::parse("v2.0.0").unwrap();

    let path = provisioner.provision(TOOL_NAME, &version).await.unwrap();

    assert!(path.is_dir());
    assert_eq!(
        fs::read(path.join("fargate.exe")).unwrap(),
        b"MZ fake fargate binary"
    );
    assert_eq!(fs::read_to_string(path.join("LICENSE")).unwrap(), "Apache-2.0");
    assert_eq!(provisioner.cache().find(TOOL_NAME, &version), Some(path));

    let fetcher_urls = provisioner_urls(&provisioner);
    assert_eq!(
        fetcher_urls,
        vec!["https://github.com/awslabs/fargatecli/releases/download/v2.0.0/fargate-v2.0.0-windows-amd64.zip"]
    );
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() {
    let tmp = tempdir().unwrap();
    let provisioner = provisioner(&tmp, "linux", "x64");
    let version = VersionTag::parse("v0.3.2").unwrap();

    let first = provisioner.provision(TOOL_NAME, &version).await.unwrap();
    // Any network access now would fail the request
    fetcher(&provisioner).offline.store(true, Ordering::SeqCst);
    let second = provisioner.provision(TOOL_NAME, &version).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fetcher(&provisioner).downloads.load(Ordering::SeqCst), 1);
    assert_eq!(provisioner.cache().versions(TOOL_NAME), vec!["v0.3.2"]);
}

#[tokio::test]
async fn test_failed_download_leaves_no_entry_and_retries() {
    let tmp = tempdir().unwrap();
    let provisioner = provisioner(&tmp, "linux", "x32");
    let version = VersionTag::parse("v0.3.2").unwrap();

    fetcher(&provisioner).offline.store(true, Ordering::SeqCst);
    let err = provisioner.provision(TOOL_NAME, &version).await.unwrap_err();
    assert!(matches!(err, ProvisionError::DownloadFailure { .. }));
    assert!(err
        .to_string()
        .contains("/download/v0.3.2/fargate-v0.3.2-linux-386.zip"));
    assert!(provisioner.cache().find(TOOL_NAME, &version).is_none());
    assert!(provisioner.cache().versions(TOOL_NAME).is_empty());

    fetcher(&provisioner).offline.store(false, Ordering::SeqCst);
    let path = provisioner.provision(TOOL_NAME, &version).await.unwrap();

    assert!(path.join("LICENSE").is_file());
    assert_eq!(fetcher(&provisioner).downloads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_versions_are_cached_independently() {
    let tmp = tempdir().unwrap();
    let provisioner = provisioner(&tmp, "darwin", "x64");

    let old = VersionTag::parse("v0.2.0").unwrap();
    let new = VersionTag::parse("v0.3.2").unwrap();
    let old_path = provisioner.provision(TOOL_NAME, &old).await.unwrap();
    let new_path = provisioner.provision(TOOL_NAME, &new).await.unwrap();

    assert_ne!(old_path, new_path);
    assert_eq!(fetcher(&provisioner).downloads.load(Ordering::SeqCst), 2);
    assert_eq!(
        provisioner.cache().versions(TOOL_NAME),
        vec!["v0.2.0", "v0.3.2"]
    );
}

#[tokio::test]
async fn test_temporary_files_are_cleaned_up() {
    let tmp = tempdir().unwrap();
    let provisioner = provisioner(&tmp, "linux", "arm");

    provisioner
        .provision(TOOL_NAME, &VersionTag::parse("v0.3.2").unwrap())
        .await
        .unwrap();

    let leftovers: Vec<_> = fs::read_dir(tmp.path().join("tmp")).unwrap().collect();
    assert!(leftovers.is_empty());
}

/// Cache that has nothing and refuses every registration.
#[derive(Default)]
struct FullDiskCache {
    attempts: AtomicUsize,
}

impl ToolCache for FullDiskCache {
    fn find(&self, _tool_name: &str, _version: &VersionTag) -> Option<PathBuf> {
        None
    }

    fn register_directory(
        &self,
        source: &Path,
        tool_name: &str,
        version: &VersionTag,
    ) -> Result<PathBuf, ProvisionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        assert!(source.join("LICENSE").is_file());
        Err(ProvisionError::registration(
            tool_name,
            version.as_str(),
            "No space left on device",
        ))
    }

    fn versions(&self, _tool_name: &str) -> Vec<String> {
        Vec::new()
    }
}

#[tokio::test]
async fn test_registration_failure_reaches_caller() {
    let tmp = tempdir().unwrap();
    let provisioner = ToolProvisioner::new(
        PlatformDescriptor::new("linux", "x64"),
        FullDiskCache::default(),
        FakeReleaseHost::default(),
        tmp.path().join("tmp"),
    );
    let version = VersionTag::parse("v0.3.2").unwrap();

    let err = provisioner.provision(TOOL_NAME, &version).await.unwrap_err();

    match &err {
        ProvisionError::CacheRegistrationFailure { tool, version: tag, .. } => {
            assert_eq!(tool, TOOL_NAME);
            assert_eq!(tag, "v0.3.2");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("No space left on device"));
    assert!(provisioner.cache().find(TOOL_NAME, &version).is_none());
    assert_eq!(provisioner.cache().attempts.load(Ordering::SeqCst), 1);
    assert_eq!(provisioner.fetcher().downloads.load(Ordering::SeqCst), 1);

    let leftovers: Vec<_> = fs::read_dir(tmp.path().join("tmp")).unwrap().collect();
    assert!(leftovers.is_empty());
}

fn fetcher(
    provisioner: &ToolProvisioner<DirectoryCache, FakeReleaseHost>,
) -> &FakeReleaseHost {
    provisioner.fetcher()
}

fn provisioner_urls(provisioner: &ToolProvisioner<DirectoryCache, FakeReleaseHost>) -> Vec<String> {
    fetcher(provisioner).urls.lock().unwrap().clone()
}
