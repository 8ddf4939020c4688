use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::plugin::catalog::SourceEntry;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::store::{DISABLED_SUFFIX, JAR_SUFFIX};

pub const INSTALL_LOG: &str = "install.log";

const CHUNK_SIZE: usize = 8192;

/// Opens a byte stream for a remote artifact.
pub trait Fetch {
    fn open(&self, url: &str) -> PluginResult<Box<dyn Read>>;
}

/// Blocking HTTP fetcher; non-2xx responses are errors.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> PluginResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aether-plugins/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| PluginError::network("(client setup)", err))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn open(&self, url: &str) -> PluginResult<Box<dyn Read>> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| PluginError::network(url, err))?;
        Ok(Box::new(response))
    }
}

/// One line of `install.log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallLogEntry {
    pub plugin: String,
    pub url: String,
    pub time: String,
}

pub struct Downloader {
    fetcher: Box<dyn Fetch>,
    scratch_dir: PathBuf,
    min_artifact_bytes: u64,
}

impl Downloader {
    pub fn new(fetcher: Box<dyn Fetch>, scratch_dir: PathBuf, min_artifact_bytes: u64) -> Self {
        Self {
            fetcher,
            scratch_dir,
            min_artifact_bytes,
        }
    }

    /// Downloads `source` into a private scratch file, validates it and
    /// publishes it as `<plugin>.jar` in `plugin_dir`.
    ///
    /// The scratch file is removed on every path. The destination is only
    /// touched by the final rename, so a failed install leaves any previous
    /// artifact as it was.
    pub fn install(
        &self,
        plugin: &str,
        plugin_dir: &Path,
        source: &SourceEntry,
    ) -> PluginResult<PathBuf> {
        fs::create_dir_all(&self.scratch_dir)
            .map_err(|err| PluginError::fs("create", &self.scratch_dir, err))?;

        let mut scratch = tempfile::Builder::new()
            .prefix(&format!("{plugin}-"))
            .suffix(".tmp")
            .tempfile_in(&self.scratch_dir)
            .map_err(|err| PluginError::fs("create scratch file in", &self.scratch_dir, err))?;

        tracing::info!("downloading {plugin} from {} ({})", source.label, source.url);
        let size = self.stream(&source.url, &mut scratch)?;
        if size < self.min_artifact_bytes {
            tracing::warn!("rejecting {plugin} from {}: only {size} bytes", source.url);
            return Err(PluginError::TooSmall {
                size,
                min: self.min_artifact_bytes,
            });
        }

        let target = plugin_dir.join(format!("{plugin}{JAR_SUFFIX}"));
        publish(scratch, &target)?;

        // The new jar is live from here on; later cleanup failures only warn.
        let disabled = plugin_dir.join(format!("{plugin}{JAR_SUFFIX}{DISABLED_SUFFIX}"));
        if disabled.exists() {
            if let Err(err) = fs::remove_file(&disabled) {
                tracing::warn!(
                    "installed {plugin} but could not remove {}: {err}",
                    disabled.display()
                );
            }
        }

        let entry = InstallLogEntry {
            plugin: plugin.to_string(),
            url: source.url.clone(),
            time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        if let Err(err) = append_log(plugin_dir, &entry) {
            tracing::warn!("failed to record install of {plugin}: {err}");
        }

        tracing::info!("installed {plugin} ({size} bytes) to {}", target.display());
        Ok(target)
    }

    fn stream(&self, url: &str, scratch: &mut NamedTempFile) -> PluginResult<u64> {
        let mut reader = self.fetcher.open(url)?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(PluginError::network(url, err)),
            };
            scratch
                .write_all(&buf[..read])
                .map_err(|err| PluginError::fs("write", scratch.path(), err))?;
            total += read as u64;
        }

        scratch
            .as_file()
            .sync_all()
            .map_err(|err| PluginError::fs("flush", scratch.path(), err))?;
        Ok(total)
    }
}

/// Moves the scratch file onto `target` with a single rename. When the scratch
/// directory sits on another filesystem the bytes are staged next to the
/// target first so the final step is still a rename.
fn publish(scratch: NamedTempFile, target: &Path) -> PluginResult<()> {
    let err = match scratch.persist(target) {
        Ok(_) => return Ok(()),
        Err(err) => err,
    };

    if err.error.kind() != io::ErrorKind::CrossesDevices {
        return Err(PluginError::fs("install", target, err.error));
    }

    let mut scratch = err.file;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::Builder::new()
        .prefix(".aether-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|err| PluginError::fs("stage in", dir, err))?;

    scratch
        .rewind()
        .and_then(|_| io::copy(&mut scratch, &mut staged))
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|err| PluginError::fs("stage", staged.path(), err))?;

    staged
        .persist(target)
        .map_err(|err| PluginError::fs("install", target, err.error))?;
    Ok(())
}

fn append_log(plugin_dir: &Path, entry: &InstallLogEntry) -> io::Result<()> {
    let line = serde_json::to_string(entry)?;
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(plugin_dir.join(INSTALL_LOG))?;
    writeln!(log, "{line}")
}
