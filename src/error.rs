use std::io;

use thiserror::Error;

/// Failures reported by the process-spawn boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("File not found")]
    ExecutableNotFound,

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Could not start process: {0}")]
    Spawn(String),
}

impl LaunchError {
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::ExecutableNotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Spawn(err.to_string()),
        }
    }
}

/// A path that exists but breaks the filename rules of the target platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameViolation {
    #[error("path contains a NUL byte")]
    NulByte,

    #[error("'{component}' contains reserved character {ch:?}")]
    ReservedCharacter { component: String, ch: char },

    #[error("'{0}' is a reserved device name")]
    ReservedName(String),

    #[error("'{0}' ends with a space or period")]
    TrailingSpaceOrDot(String),

    #[error("path is {len} characters long, limit is {max}")]
    PathTooLong { len: usize, max: usize },

    #[error("'{component}' is longer than {max} bytes")]
    ComponentTooLong { component: String, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_launch_errors() {
        let not_found = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(LaunchError::from_io(&not_found), LaunchError::ExecutableNotFound);

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        assert_eq!(
            LaunchError::from_io(&denied),
            LaunchError::PermissionDenied("Permission denied".into())
        );

        let other = io::Error::new(io::ErrorKind::Other, "exec format error");
        assert!(matches!(LaunchError::from_io(&other), LaunchError::Spawn(_)));
    }

    #[test]
    fn not_found_reads_as_file_not_found() {
        assert_eq!(LaunchError::ExecutableNotFound.to_string(), "File not found");
    }
}
