//! Caller authorization: the wrapper only works for a parent running as the configured group.
//!
//! A setgid wrapper keeps the caller's group as its real gid, so the real gid identifies
//! which server invoked it. The check resolves that gid to a name and compares it exactly.

use nix::unistd::{Gid, Group};

use crate::error::WrapperError;
use crate::invocation::Mode;

/// Resolves the caller's group and compares it against `expected_group`.
/// Returns the caller's group name on success.
pub trait CallerCheck {
    fn check_caller(
        &self,
        ident: &str,
        expected_group: &str,
        mode: Mode,
    ) -> Result<String, WrapperError>;
}

/// Proof that the caller check passed. Only [`authorize`] constructs one, and
/// dispatch requires it.
#[derive(Debug)]
pub struct Authorized {
    group: String,
}

impl Authorized {
    /// Group the caller was authorized as.
    pub fn group(&self) -> &str {
        &self.group
    }
}

/// Run the caller check and turn success into an [`Authorized`] token.
pub fn authorize<C: CallerCheck + ?Sized>(
    check: &C,
    ident: &str,
    expected_group: &str,
    mode: Mode,
) -> Result<Authorized, WrapperError> {
    let group = check.check_caller(ident, expected_group, mode)?;
    log::debug!("{}: caller authorized as group {}", ident, group);
    Ok(Authorized { group })
}

/// Checks the real gid of this process against the group database.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessGroupCheck;

impl CallerCheck for ProcessGroupCheck {
    fn check_caller(
        &self,
        ident: &str,
        expected_group: &str,
        mode: Mode,
    ) -> Result<String, WrapperError> {
        let gid = Gid::current();
        let group = match Group::from_gid(gid) {
            Ok(Some(group)) => group.name,
            Ok(None) => return Err(name_not_found(gid.as_raw(), expected_group, mode)),
            Err(errno) => {
                log::warn!("{}: group lookup for gid {} failed: {}", ident, gid, errno);
                return Err(name_not_found(gid.as_raw(), expected_group, mode));
            }
        };
        match_group(&group, expected_group, mode)?;
        Ok(group)
    }
}

fn name_not_found(gid: u32, expected: &str, mode: Mode) -> WrapperError {
    WrapperError::GroupNameNotFound {
        gid,
        expected: expected.to_string(),
        wrapper: mode.wrapper_label(),
        server: mode.server_label(),
    }
}

/// Exact comparison of a resolved group name against the expected one.
pub fn match_group(actual: &str, expected: &str, mode: Mode) -> Result<(), WrapperError> {
    if actual == expected {
        return Ok(());
    }
    Err(WrapperError::GroupMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
        wrapper: mode.wrapper_label(),
        server: mode.server_label(),
    })
}
