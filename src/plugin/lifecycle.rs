use std::fs;
use std::path::Path;

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::store::PluginArtifact;

/// Caller's answer to the "really delete?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Flips a plugin between enabled and disabled by renaming its artifact.
///
/// Returns the descriptor for the renamed file. The rename never overwrites an
/// existing file, so a directory holding both variants is left untouched.
pub fn toggle(plugin: &PluginArtifact, dir: &Path) -> PluginResult<PluginArtifact> {
    let src = dir.join(&plugin.file_name);
    let target_name = plugin.toggled_file_name();
    let dst = dir.join(&target_name);

    if dst.exists() {
        return Err(PluginError::Conflict {
            name: plugin.name.clone(),
        });
    }

    fs::rename(&src, &dst).map_err(|err| PluginError::fs("rename", &src, err))?;

    let mut toggled = plugin.clone();
    toggled.file_name = target_name;
    toggled.enabled = !plugin.enabled;
    toggled.conflicted = false;

    tracing::info!(
        "plugin {} {} in {}",
        toggled.name,
        toggled.state().label(),
        dir.display()
    );
    Ok(toggled)
}

/// Removes a plugin artifact. Nothing happens unless the caller confirmed;
/// returns whether the file was removed.
pub fn delete(
    plugin: &PluginArtifact,
    dir: &Path,
    confirmation: Confirmation,
) -> PluginResult<bool> {
    if confirmation == Confirmation::Declined {
        return Ok(false);
    }

    let path = dir.join(&plugin.file_name);
    fs::remove_file(&path).map_err(|err| PluginError::fs("delete", &path, err))?;

    tracing::info!("plugin {} deleted from {}", plugin.name, dir.display());
    Ok(true)
}
