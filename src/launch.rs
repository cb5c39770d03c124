use std::cell::RefCell;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::LaunchError;

/// The process-spawn boundary.
pub trait Launch {
    fn launch(&self, path: &str, args: &[String]) -> Result<(), LaunchError>;

    /// Collects children that have exited and returns how many are still
    /// running. Called once per event-loop tick.
    fn reap_finished(&self) -> usize {
        0
    }
}

/// Spawns detached from the terminal and never blocks on the child. Handles
/// are kept so exited children can be reaped without waiting.
#[derive(Default)]
pub struct ProcessLauncher {
    children: RefCell<Vec<Child>>,
}

impl Launch for ProcessLauncher {
    fn launch(&self, path: &str, args: &[String]) -> Result<(), LaunchError> {
        let spawned = Command::new(path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => {
                info!(path, pid = child.id(), "process started");
                self.reap_finished();
                self.children.borrow_mut().push(child);
                Ok(())
            }
            Err(err) => {
                warn!(path, %err, "process failed to start");
                Err(LaunchError::from_io(&err))
            }
        }
    }

    fn reap_finished(&self) -> usize {
        let mut children = self.children.borrow_mut();
        children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = child.id(), %status, "process exited");
                false
            }
            Ok(None) => true,
            Err(err) => {
                warn!(pid = child.id(), %err, "could not poll process, dropping handle");
                false
            }
        });
        children.len()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_executable_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-program");
        let launcher = ProcessLauncher::default();
        let result = launcher.launch(&missing.to_string_lossy(), &[]);
        assert_eq!(result, Err(LaunchError::ExecutableNotFound));
        assert_eq!(launcher.reap_finished(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_permission_denied() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.txt");
        std::fs::write(&file, b"not a program").unwrap();
        let result = ProcessLauncher::default().launch(&file.to_string_lossy(), &[]);
        assert!(matches!(result, Err(LaunchError::PermissionDenied(_))));
    }

    #[cfg(unix)]
    #[test]
    fn exited_children_are_reaped() {
        let launcher = ProcessLauncher::default();
        launcher.launch("/bin/true", &[]).unwrap();
        launcher.launch("/bin/true", &[]).unwrap();
        // the second launch may already have reaped the first child
        assert!(!launcher.children.borrow().is_empty());

        let mut running = launcher.reap_finished();
        for _ in 0..250 {
            if running == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
            running = launcher.reap_finished();
        }
        assert_eq!(running, 0);
        assert!(launcher.children.borrow().is_empty());
    }
}
