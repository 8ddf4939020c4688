use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::plugin::error::{PluginError, PluginResult};

/// Answers whether a process id belongs to a live process.
pub trait LivenessProbe {
    fn is_alive(&self, pid: i32) -> bool;
}

/// Probes the real process table with a null signal.
#[derive(Debug, Default)]
pub struct ProcessProbe;

impl LivenessProbe for ProcessProbe {
    #[cfg(unix)]
    fn is_alive(&self, pid: i32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        if pid <= 0 {
            return false;
        }

        match kill(Pid::from_raw(pid), None) {
            Ok(()) => true,
            // Exists, but owned by another user.
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    fn is_alive(&self, _pid: i32) -> bool {
        false
    }
}

/// Enumerates server instances under `versions/` and derives their paths and liveness.
pub struct InstanceRegistry {
    versions_dir: PathBuf,
    separator: String,
    mod_loaders: Vec<String>,
    probe: Box<dyn LivenessProbe>,
}

impl InstanceRegistry {
    pub fn new(
        versions_dir: PathBuf,
        separator: impl Into<String>,
        mod_loaders: Vec<String>,
        probe: Box<dyn LivenessProbe>,
    ) -> Self {
        Self {
            versions_dir,
            separator: separator.into(),
            mod_loaders,
            probe,
        }
    }

    pub fn versions_dir(&self) -> &Path {
        &self.versions_dir
    }

    /// Instance names sorted case-insensitively; empty when the root is missing.
    pub fn list_instances(&self) -> Vec<String> {
        if !self.versions_dir.is_dir() {
            return Vec::new();
        }

        let mut names: Vec<String> = WalkBuilder::new(&self.versions_dir)
            .max_depth(Some(1))
            .standard_filters(false)
            .follow_links(true)
            .build()
            .flatten()
            .filter_map(|entry| {
                if entry.path() == self.versions_dir {
                    return None;
                }

                let metadata = entry.metadata().ok()?;
                if !metadata.is_dir() {
                    return None;
                }
                entry.file_name().to_str().map(str::to_string)
            })
            .collect();

        names.sort_by_key(|name| name.to_lowercase());
        names
    }

    pub fn instance_dir(&self, instance: &str) -> PathBuf {
        self.versions_dir.join(instance)
    }

    pub fn core_type<'a>(&self, instance: &'a str) -> &'a str {
        instance
            .split(self.separator.as_str())
            .next()
            .unwrap_or(instance)
    }

    pub fn plugin_dir_name(&self, instance: &str) -> &'static str {
        let core = self.core_type(instance);
        if self.mod_loaders.iter().any(|loader| loader == core) {
            "mods"
        } else {
            "plugins"
        }
    }

    /// Path of the instance's plugin directory, without touching the filesystem.
    pub fn plugin_dir(&self, instance: &str) -> PathBuf {
        self.instance_dir(instance).join(self.plugin_dir_name(instance))
    }

    /// Like [`Self::plugin_dir`], creating the directory if it is missing.
    pub fn resolve_plugin_dir(&self, instance: &str) -> PluginResult<PathBuf> {
        let dir = self.plugin_dir(instance);
        fs::create_dir_all(&dir).map_err(|err| PluginError::fs("create", &dir, err))?;
        Ok(dir)
    }

    /// Never fails: a missing or unreadable pid file, or a dead pid, all mean "not running".
    pub fn check_running(&self, instance: &str) -> bool {
        let pid_file = self.instance_dir(instance).join("server.pid");
        let Ok(raw) = fs::read_to_string(&pid_file) else {
            return false;
        };

        match raw.trim().parse::<i32>() {
            Ok(pid) => self.probe.is_alive(pid),
            Err(err) => {
                tracing::warn!("ignoring malformed pid file {}: {err}", pid_file.display());
                false
            }
        }
    }
}
