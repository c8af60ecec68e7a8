use crate::error::ProvisionError;
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Fetches a release archive to a local file.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn download(&self, url: &str, local_path: &Path) -> Result<(), ProvisionError>;
}

/// Plain HTTP(S) GET. No auth headers, no retry, no timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(show_progress: bool) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("setup-fargate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            show_progress,
        })
    }

    fn progress_bar(&self, total_size: u64, filename: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::with_template(
            "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Downloading {}", filename));
        pb
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn download(&self, url: &str, local_path: &Path) -> Result<(), ProvisionError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProvisionError::download(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProvisionError::download(url, format!("HTTP {}", status)));
        }

        let total_size = response.content_length().unwrap_or(0);
        let filename = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| url.to_string());
        let pb = self.progress_bar(total_size, &filename);

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| ProvisionError::download(url, e))?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ProvisionError::download(url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ProvisionError::download(url, e))?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush()
            .await
            .map_err(|e| ProvisionError::download(url, e))?;

        pb.finish_and_clear();
        tracing::debug!("Downloaded {} bytes to {}", downloaded, local_path.display());
        Ok(())
    }
}

fn extraction_error<E: std::fmt::Display>(archive: &Path) -> impl Fn(E) -> ProvisionError + '_ {
    move |e| ProvisionError::extraction(archive, e)
}

/// Unpack a ZIP archive into `extract_dir`, which must already exist.
/// Entries whose names escape the target directory are skipped.
pub fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<PathBuf, ProvisionError> {
    let file = fs::File::open(archive_path).map_err(extraction_error(archive_path))?;
    let mut archive = zip::ZipArchive::new(file).map_err(extraction_error(archive_path))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(extraction_error(archive_path))?;
        let relative = match entry.enclosed_name() {
            Some(name) => name.to_path_buf(),
            None => {
                tracing::warn!("Skipping malicious path in zip: {}", entry.name());
                continue;
            }
        };
        let outpath = extract_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(extraction_error(archive_path))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(extraction_error(archive_path))?;
        }
        let mut outfile = fs::File::create(&outpath).map_err(extraction_error(archive_path))?;
        io::copy(&mut entry, &mut outfile).map_err(extraction_error(archive_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Release zips do not always record modes; default to executable
            let mode = entry.unix_mode().filter(|m| m & 0o777 != 0).unwrap_or(0o755);
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode & 0o777))
                .map_err(extraction_error(archive_path))?;
        }
    }

    tracing::debug!(
        "Extracted {} entries from {} into {}",
        archive.len(),
        archive_path.display(),
        extract_dir.display()
    );
    Ok(extract_dir.to_path_buf())
}
