use std::collections::HashMap;
use std::path::Path;

use ignore::WalkBuilder;

pub const JAR_SUFFIX: &str = ".jar";
pub const DISABLED_SUFFIX: &str = ".disabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Enabled,
    Disabled,
}

impl PluginState {
    pub fn label(self) -> &'static str {
        match self {
            PluginState::Enabled => "enabled",
            PluginState::Disabled => "disabled",
        }
    }
}

/// One plugin artifact found in a plugin directory. The file name is the only
/// source of truth for its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginArtifact {
    pub name: String,
    pub file_name: String,
    pub enabled: bool,
    pub size_bytes: u64,
    /// Set when the enabled and disabled variants of `name` both exist.
    pub conflicted: bool,
}

impl PluginArtifact {
    /// Builds a descriptor from a file name, or `None` if it is not a plugin artifact.
    pub fn from_file_name(file_name: &str, size_bytes: u64) -> Option<Self> {
        if !is_artifact_name(file_name) {
            return None;
        }

        let enabled = !file_name.ends_with(DISABLED_SUFFIX);
        let stem = file_name.strip_suffix(DISABLED_SUFFIX).unwrap_or(file_name);
        let name = stem.strip_suffix(JAR_SUFFIX).unwrap_or(stem);

        Some(Self {
            name: name.to_string(),
            file_name: file_name.to_string(),
            enabled,
            size_bytes,
            conflicted: false,
        })
    }

    pub fn state(&self) -> PluginState {
        if self.enabled {
            PluginState::Enabled
        } else {
            PluginState::Disabled
        }
    }

    pub fn size_kib(&self) -> u64 {
        self.size_bytes / 1024
    }

    /// File name after a toggle: strips or appends the `.disabled` suffix.
    pub fn toggled_file_name(&self) -> String {
        match self.file_name.strip_suffix(DISABLED_SUFFIX) {
            Some(enabled) => enabled.to_string(),
            None => format!("{}{DISABLED_SUFFIX}", self.file_name),
        }
    }
}

fn is_artifact_name(file_name: &str) -> bool {
    file_name.ends_with(JAR_SUFFIX) || file_name.ends_with(".jar.disabled")
}

/// Scans `dir` for plugin artifacts, sorted by logical name. A missing or
/// empty directory yields an empty list. Symlinks count as the file they
/// point at; dangling ones are skipped.
pub fn list_plugins(dir: &Path) -> Vec<PluginArtifact> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut plugins: Vec<PluginArtifact> = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .follow_links(true)
        .build()
        .flatten()
        .filter_map(|entry| {
            if entry.path() == dir {
                return None;
            }

            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let file_name = entry.file_name().to_str()?;
            PluginArtifact::from_file_name(file_name, metadata.len())
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for plugin in &plugins {
        *counts.entry(plugin.name.clone()).or_default() += 1;
    }
    for plugin in &mut plugins {
        if counts.get(&plugin.name).copied().unwrap_or(0) > 1 {
            tracing::warn!(
                "plugin {} has both enabled and disabled artifacts in {}",
                plugin.name,
                dir.display()
            );
            plugin.conflicted = true;
        }
    }

    plugins.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    tracing::debug!("found {} plugins in {}", plugins.len(), dir.display());
    plugins
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn absent_or_empty_directory_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(list_plugins(&tmp.path().join("missing")).is_empty());
        assert!(list_plugins(tmp.path()).is_empty());
    }

    #[test]
    fn derives_names_and_states_from_suffixes() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Geyser.jar.disabled"), vec![0u8; 2048]).unwrap();
        fs::write(tmp.path().join("LuckPerms.jar"), b"jar").unwrap();
        fs::write(tmp.path().join("install.log"), b"{}").unwrap();
        fs::write(tmp.path().join("readme.disabled"), b"").unwrap();
        fs::create_dir(tmp.path().join("Folder.jar")).unwrap();

        let plugins = list_plugins(tmp.path());
        assert_eq!(plugins.len(), 2);

        assert_eq!(plugins[0].name, "Geyser");
        assert_eq!(plugins[0].state(), PluginState::Disabled);
        assert_eq!(plugins[0].size_kib(), 2);

        assert_eq!(plugins[1].name, "LuckPerms");
        assert!(plugins[1].enabled);
        assert!(!plugins[1].conflicted);
    }

    #[test]
    fn strips_exactly_one_suffix_of_each_kind() {
        let artifact = PluginArtifact::from_file_name("odd.jar.jar.disabled", 0).unwrap();
        assert_eq!(artifact.name, "odd.jar");
        assert!(!artifact.enabled);
        assert_eq!(artifact.toggled_file_name(), "odd.jar.jar");

        assert!(PluginArtifact::from_file_name("notes.txt", 0).is_none());
        assert!(PluginArtifact::from_file_name("Thing.disabled", 0).is_none());
    }

    #[test]
    fn coexisting_variants_are_flagged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Geyser.jar"), b"a").unwrap();
        fs::write(tmp.path().join("Geyser.jar.disabled"), b"b").unwrap();
        fs::write(tmp.path().join("Floodgate.jar"), b"c").unwrap();

        let plugins = list_plugins(tmp.path());
        let geyser: Vec<_> = plugins.iter().filter(|p| p.name == "Geyser").collect();
        assert_eq!(geyser.len(), 2);
        assert!(geyser.iter().all(|p| p.conflicted));
        assert!(
            !plugins
                .iter()
                .find(|p| p.name == "Floodgate")
                .unwrap()
                .conflicted
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_artifacts_are_listed() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("jars");
        let plugins = tmp.path().join("plugins");
        fs::create_dir_all(&store).unwrap();
        fs::create_dir_all(&plugins).unwrap();
        fs::write(store.join("geyser-2.4.jar"), vec![0u8; 20 * 1024]).unwrap();
        std::os::unix::fs::symlink(store.join("geyser-2.4.jar"), plugins.join("Geyser.jar"))
            .unwrap();
        std::os::unix::fs::symlink(store.join("gone.jar"), plugins.join("Gone.jar")).unwrap();

        let listed = list_plugins(&plugins);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].file_name, "Geyser.jar");
        assert_eq!(listed[0].size_kib(), 20);
    }
}
