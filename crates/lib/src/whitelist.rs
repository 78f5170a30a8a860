//! Command whitelist: the fixed set of scripts the wrapper will run for a caller.
//! Membership is exact byte equality; no prefix, case folding or path handling.

/// Scripts a web or shell caller may request.
pub const VALID_SCRIPTS: &[&str] = &[
    "admindb",
    "admin",
    "confirm",
    "create",
    "edithtml",
    "listinfo",
    "options",
    "private",
    "rmlist",
    "roster",
    "subscribe",
];

/// Immutable whitelist of script names.
#[derive(Debug, Clone, Copy)]
pub struct CommandWhitelist {
    entries: &'static [&'static str],
}

impl CommandWhitelist {
    pub const fn new(entries: &'static [&'static str]) -> Self {
        Self { entries }
    }

    /// True iff `command` is exactly one of the entries.
    pub fn is_valid(&self, command: &str) -> bool {
        self.entries.iter().any(|entry| *entry == command)
    }

    pub fn entries(&self) -> &'static [&'static str] {
        self.entries
    }
}

impl Default for CommandWhitelist {
    fn default() -> Self {
        script_whitelist()
    }
}

/// The whitelist of list-management scripts.
pub const fn script_whitelist() -> CommandWhitelist {
    CommandWhitelist::new(VALID_SCRIPTS)
}

/// Compile-time membership test, used to reject a CGI build for a script
/// outside the whitelist. Same semantics as [`CommandWhitelist::is_valid`].
pub const fn contains_script(entries: &[&str], script: &str) -> bool {
    let mut i = 0;
    while i < entries.len() {
        if bytes_eq(entries[i].as_bytes(), script.as_bytes()) {
            return true;
        }
        i += 1;
    }
    false
}

const fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_script_is_valid() {
        let wl = script_whitelist();
        for script in VALID_SCRIPTS {
            assert!(wl.is_valid(script), "{} should be valid", script);
        }
    }

    #[test]
    fn near_misses_are_rejected() {
        let wl = script_whitelist();
        for bad in [
            "",
            "admin ",
            " admin",
            "Admin",
            "ADMIN",
            "admin/x",
            "../admin",
            "/usr/bin/admin",
            "adm",
            "admindbx",
            "admin\0",
            "shutdown",
        ] {
            assert!(!wl.is_valid(bad), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn const_check_agrees_with_runtime_check() {
        let wl = script_whitelist();
        for candidate in ["admin", "admindb", "roster", "Roster", "rost", "", "x/y"] {
            assert_eq!(
                contains_script(VALID_SCRIPTS, candidate),
                wl.is_valid(candidate),
                "mismatch for {:?}",
                candidate
            );
        }
    }

    #[test]
    fn custom_whitelist_only_knows_its_entries() {
        static ONLY: &[&str] = &["listinfo"];
        let wl = CommandWhitelist::new(ONLY);
        assert!(wl.is_valid("listinfo"));
        assert!(!wl.is_valid("admin"));
        assert_eq!(wl.entries(), ONLY);
    }
}
