//! Wrapper failures and their stable exit codes.
//!
//! Codes are kept distinct so an operator reading syslog can tell which stage
//! rejected an invocation without the accompanying message.

use thiserror::Error;

/// Exit code for a successful handoff.
pub const EXIT_SUCCESS: i32 = 0;
/// Caller's group is not the configured parent group.
pub const GROUP_MISMATCH: i32 = 2;
/// Could not set the real gid to the effective gid before exec.
pub const SETREGID_FAILURE: i32 = 3;
/// The interpreter could not be executed.
pub const EXECVE_FAILURE: i32 = 4;
/// Wrong argument count.
pub const USAGE_ERROR: i32 = 5;
/// Requested command is not whitelisted.
pub const ILLEGAL_COMMAND: i32 = 6;
/// Caller's gid has no entry in the group database.
pub const GROUP_NAME_NOT_FOUND: i32 = 8;

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    IllegalCommand,
    Authorization,
    Dispatch,
}

/// Everything that can stop an invocation. Each variant is terminal.
#[derive(Debug, Error)]
pub enum WrapperError {
    #[error("Usage: {program} program [args...]")]
    Usage { program: String },

    #[error("Illegal command: {command}")]
    IllegalCommand { command: String },

    #[error(
        "Failure to find group name for GID {gid}.  Expected the {wrapper} wrapper to be \
         executed as group \"{expected}\", but the system's {server} server executed the \
         wrapper as GID {gid} for which the name could not be found.  Try adding GID {gid} \
         to your system as \"{expected}\", or tweak your {server} server to run the wrapper \
         as group \"{expected}\"."
    )]
    GroupNameNotFound {
        gid: u32,
        expected: String,
        wrapper: &'static str,
        server: &'static str,
    },

    #[error(
        "Group mismatch error.  Expected the {wrapper} wrapper script to be executed as \
         group \"{expected}\", but the system's {server} server executed the {wrapper} \
         script as group \"{actual}\".  Try tweaking the {server} server to run the script \
         as group \"{expected}\", or rebuild with LISTGATE_CGI_GROUP={actual}."
    )]
    GroupMismatch {
        expected: String,
        actual: String,
        wrapper: &'static str,
        server: &'static str,
    },

    #[error("{0}")]
    SetRegid(#[source] std::io::Error),

    #[error("{0}")]
    Exec(#[source] std::io::Error),
}

impl WrapperError {
    /// Stable process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            WrapperError::Usage { .. } => USAGE_ERROR,
            WrapperError::IllegalCommand { .. } => ILLEGAL_COMMAND,
            WrapperError::GroupNameNotFound { .. } => GROUP_NAME_NOT_FOUND,
            WrapperError::GroupMismatch { .. } => GROUP_MISMATCH,
            WrapperError::SetRegid(_) => SETREGID_FAILURE,
            WrapperError::Exec(_) => EXECVE_FAILURE,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WrapperError::Usage { .. } => ErrorKind::Usage,
            WrapperError::IllegalCommand { .. } => ErrorKind::IllegalCommand,
            WrapperError::GroupNameNotFound { .. } | WrapperError::GroupMismatch { .. } => {
                ErrorKind::Authorization
            }
            WrapperError::SetRegid(_) | WrapperError::Exec(_) => ErrorKind::Dispatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            WrapperError::Usage {
                program: "w".to_string(),
            },
            WrapperError::IllegalCommand {
                command: "x".to_string(),
            },
            WrapperError::GroupNameNotFound {
                gid: 1,
                expected: "www-data".to_string(),
                wrapper: "CGI",
                server: "web",
            },
            WrapperError::GroupMismatch {
                expected: "www-data".to_string(),
                actual: "nogroup".to_string(),
                wrapper: "CGI",
                server: "web",
            },
            WrapperError::SetRegid(std::io::Error::from_raw_os_error(libc::EPERM)),
            WrapperError::Exec(std::io::Error::from_raw_os_error(libc::ENOENT)),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&EXIT_SUCCESS));
    }

    #[test]
    fn group_errors_are_authorization_kind() {
        let err = WrapperError::GroupMismatch {
            expected: "www-data".to_string(),
            actual: "users".to_string(),
            wrapper: "CGI",
            server: "web",
        };
        assert_eq!(err.kind(), ErrorKind::Authorization);
        let msg = err.to_string();
        assert!(msg.contains("\"www-data\""));
        assert!(msg.contains("\"users\""));
    }

    #[test]
    fn illegal_command_message() {
        let err = WrapperError::IllegalCommand {
            command: "shutdown".to_string(),
        };
        assert_eq!(err.to_string(), "Illegal command: shutdown");
        assert_eq!(err.kind(), ErrorKind::IllegalCommand);
    }
}
