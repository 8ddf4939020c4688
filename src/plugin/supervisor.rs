use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::model::instance::InstanceRegistry;

pub const START_SCRIPT: &str = "start.sh";
pub const STOP_SCRIPT: &str = "stop.sh";

/// Stops and starts instances through their `stop.sh` / `start.sh` scripts.
#[derive(Debug, Clone)]
pub struct Supervisor {
    grace: Duration,
}

impl Supervisor {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Best-effort restart. The stop script's exit status is ignored and
    /// shutdown is not polled for; the grace period is the only wait.
    /// Returns `false` when there is no start script or it cannot be spawned.
    pub fn restart(&self, registry: &InstanceRegistry, instance: &str) -> bool {
        let instance_dir = registry.instance_dir(instance);
        let stop_script = instance_dir.join(STOP_SCRIPT);
        let start_script = instance_dir.join(START_SCRIPT);

        if registry.check_running(instance) && stop_script.is_file() {
            tracing::info!("stopping {instance}");
            if let Err(err) = Command::new(&stop_script)
                .current_dir(&instance_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                tracing::warn!("stop script for {instance} failed to run: {err}");
            }
            thread::sleep(self.grace);
        }

        if !start_script.is_file() {
            tracing::warn!("{instance} has no {START_SCRIPT}, not starting");
            return false;
        }

        match Command::new(&start_script)
            .current_dir(&instance_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                tracing::info!("started {instance} (pid {})", child.id());
                // Reap the launcher in the background so it never lingers as a zombie.
                thread::spawn(move || {
                    let _ = child.wait();
                });
                true
            }
            Err(err) => {
                tracing::warn!("failed to launch {}: {err}", start_script.display());
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::model::instance::tests::registry;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Instant;
    use tempfile::TempDir;

    // Writing a script while another test forks can fail exec with ETXTBSY.
    static SCRIPTS: Mutex<()> = Mutex::new(());

    fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn wait_for(path: &Path) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if path.exists() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn restart_without_start_script_fails() {
        let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
        let tmp = TempDir::new().unwrap();
        let registry = registry(tmp.path(), vec![]);
        fs::create_dir_all(registry.instance_dir("Paper-1.20")).unwrap();

        assert!(!Supervisor::new(Duration::ZERO).restart(&registry, "Paper-1.20"));
    }

    #[test]
    fn stopped_instance_is_only_started() {
        let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
        let tmp = TempDir::new().unwrap();
        let registry = registry(tmp.path(), vec![]);
        let dir = registry.instance_dir("Paper-1.20");
        fs::create_dir_all(&dir).unwrap();
        write_script(&dir.join(STOP_SCRIPT), "touch stopped");
        write_script(&dir.join(START_SCRIPT), "touch started");

        assert!(Supervisor::new(Duration::ZERO).restart(&registry, "Paper-1.20"));
        assert!(wait_for(&dir.join("started")));
        assert!(!dir.join("stopped").exists());
    }

    #[test]
    fn running_instance_is_stopped_then_started() {
        let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
        let tmp = TempDir::new().unwrap();
        let registry = registry(tmp.path(), vec![4242]);
        let dir = registry.instance_dir("Paper-1.20");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("server.pid"), "4242").unwrap();
        write_script(&dir.join(STOP_SCRIPT), "touch stopped");
        write_script(&dir.join(START_SCRIPT), "touch started");

        assert!(Supervisor::new(Duration::from_millis(10)).restart(&registry, "Paper-1.20"));
        assert!(dir.join("stopped").exists());
        assert!(wait_for(&dir.join("started")));
    }

    #[test]
    fn missing_stop_script_is_skipped() {
        let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
        let tmp = TempDir::new().unwrap();
        let registry = registry(tmp.path(), vec![7]);
        let dir = registry.instance_dir("Fabric-1.20");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("server.pid"), "7").unwrap();
        write_script(&dir.join(START_SCRIPT), "touch started");

        assert!(Supervisor::new(Duration::ZERO).restart(&registry, "Fabric-1.20"));
        assert!(wait_for(&dir.join("started")));
    }
}
