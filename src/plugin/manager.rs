use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;
use crate::model::instance::{InstanceRegistry, ProcessProbe};
use crate::plugin::catalog::{SourceCatalog, SourceEntry};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::installer::{Downloader, HttpFetcher};
use crate::plugin::lifecycle::{self, Confirmation};
use crate::plugin::store::{self, PluginArtifact};
use crate::plugin::supervisor::Supervisor;

/// Outcome of a state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub message: String,
    /// The instance is running with the old plugin set and should be restarted.
    pub needs_restart: bool,
}

/// Entry point for every plugin operation the UI performs. Nothing in here
/// prompts; restart decisions are handed back through [`Change`].
pub struct PluginManager {
    registry: InstanceRegistry,
    catalog: SourceCatalog,
    downloader: Downloader,
    supervisor: Supervisor,
}

impl PluginManager {
    pub fn new(config: &AppConfig) -> PluginResult<Self> {
        let registry = InstanceRegistry::new(
            config.versions_dir(),
            config.instances.separator.clone(),
            config.instances.mod_loaders.clone(),
            Box::new(ProcessProbe),
        );
        let fetcher = HttpFetcher::new(config.download_timeout())?;
        let downloader = Downloader::new(
            Box::new(fetcher),
            config.scratch_dir(),
            config.download.min_artifact_bytes,
        );

        Ok(Self::from_parts(
            registry,
            SourceCatalog::new(config.catalog.clone()),
            downloader,
            Supervisor::new(config.restart_grace()),
        ))
    }

    pub fn from_parts(
        registry: InstanceRegistry,
        catalog: SourceCatalog,
        downloader: Downloader,
        supervisor: Supervisor,
    ) -> Self {
        Self {
            registry,
            catalog,
            downloader,
            supervisor,
        }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn versions_dir(&self) -> &Path {
        self.registry.versions_dir()
    }

    pub fn list_instances(&self) -> Vec<String> {
        self.registry.list_instances()
    }

    pub fn resolve_plugin_dir(&self, instance: &str) -> PluginResult<PathBuf> {
        self.registry.resolve_plugin_dir(instance)
    }

    /// The plugin directory if it already exists; management never creates it.
    pub fn existing_plugin_dir(&self, instance: &str) -> Option<PathBuf> {
        let dir = self.registry.plugin_dir(instance);
        dir.is_dir().then_some(dir)
    }

    pub fn list_plugins(&self, dir: &Path) -> Vec<PluginArtifact> {
        store::list_plugins(dir)
    }

    pub fn check_running(&self, instance: &str) -> bool {
        self.registry.check_running(instance)
    }

    pub fn restart(&self, instance: &str) -> bool {
        self.supervisor.restart(&self.registry, instance)
    }

    /// Installs `plugin` from `source`, which must be one of its catalogued mirrors.
    pub fn install(
        &self,
        plugin: &str,
        instance: &str,
        dir: &Path,
        source: &SourceEntry,
    ) -> PluginResult<Change> {
        let configured = self.catalog.source(plugin, &source.label)?;
        if configured.url != source.url {
            return Err(PluginError::UnknownSource {
                plugin: plugin.to_string(),
                label: source.label.clone(),
            });
        }

        self.downloader.install(plugin, dir, configured)?;
        Ok(self.change(instance, format!("plugin {plugin} installed")))
    }

    pub fn toggle(
        &self,
        plugin: &PluginArtifact,
        dir: &Path,
        instance: &str,
    ) -> PluginResult<(PluginArtifact, Change)> {
        let toggled = lifecycle::toggle(plugin, dir)?;
        let message = format!("plugin {} {}", toggled.name, toggled.state().label());
        Ok((toggled, self.change(instance, message)))
    }

    /// Returns `None` when the caller declined.
    pub fn delete(
        &self,
        plugin: &PluginArtifact,
        dir: &Path,
        instance: &str,
        confirmation: Confirmation,
    ) -> PluginResult<Option<Change>> {
        if !lifecycle::delete(plugin, dir, confirmation)? {
            return Ok(None);
        }
        let message = format!("plugin {} deleted", plugin.name);
        Ok(Some(self.change(instance, message)))
    }

    fn change(&self, instance: &str, message: String) -> Change {
        Change {
            message,
            needs_restart: self.registry.check_running(instance),
        }
    }
}
