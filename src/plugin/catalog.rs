use serde::Deserialize;

use crate::plugin::error::{PluginError, PluginResult};

/// A named download mirror for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceEntry {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

/// Static mapping from plugin name to its ordered mirrors.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    entries: Vec<CatalogEntry>,
}

impl SourceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn sources(&self, plugin: &str) -> PluginResult<&[SourceEntry]> {
        self.entries
            .iter()
            .find(|entry| entry.name == plugin)
            .map(|entry| entry.sources.as_slice())
            .filter(|sources| !sources.is_empty())
            .ok_or_else(|| PluginError::NoSources(plugin.to_string()))
    }

    /// Resolves a caller-chosen source, which must be one of the plugin's configured mirrors.
    pub fn source(&self, plugin: &str, label: &str) -> PluginResult<&SourceEntry> {
        self.sources(plugin)?
            .iter()
            .find(|source| source.label == label)
            .ok_or_else(|| PluginError::UnknownSource {
                plugin: plugin.to_string(),
                label: label.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::error::ErrorKind;

    fn catalog() -> SourceCatalog {
        SourceCatalog::new(vec![
            CatalogEntry {
                name: "LuckPerms".to_string(),
                description: Some("Permission management".to_string()),
                sources: vec![
                    SourceEntry {
                        label: "Modrinth".to_string(),
                        url: "https://cdn.example/lp.jar".to_string(),
                    },
                    SourceEntry {
                        label: "GitHub".to_string(),
                        url: "https://github.example/lp.jar".to_string(),
                    },
                ],
            },
            CatalogEntry {
                name: "Empty".to_string(),
                description: None,
                sources: Vec::new(),
            },
        ])
    }

    #[test]
    fn sources_keep_configured_order() {
        let catalog = catalog();
        let labels: Vec<&str> = catalog
            .sources("LuckPerms")
            .unwrap()
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Modrinth", "GitHub"]);
    }

    #[test]
    fn unknown_or_empty_plugins_are_configuration_errors() {
        let catalog = catalog();
        assert_eq!(
            catalog.sources("Nope").unwrap_err().kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            catalog.sources("Empty").unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn source_must_belong_to_plugin() {
        let catalog = catalog();
        assert_eq!(
            catalog.source("LuckPerms", "GitHub").unwrap().url,
            "https://github.example/lp.jar"
        );
        assert!(matches!(
            catalog.source("LuckPerms", "SpigotMC"),
            Err(PluginError::UnknownSource { .. })
        ));
    }
}
