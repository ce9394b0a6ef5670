//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::option::TelnetOption;

/// Tracks the local/remote enabled state and in-flight negotiations for a
/// set of Telnet options on a single connection.
///
/// Options are implicitly `false` (disabled) until explicitly initialized or
/// set; `initialize` merely seeds the maps so `status` can enumerate a known
/// set of options before any negotiation has happened.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    local: HashMap<u8, bool>,
    remote: HashMap<u8, bool>,
    pending_local: HashSet<u8>,
    pending_remote: HashSet<u8>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `options` into both local and remote maps as disabled.
    pub fn initialize(&mut self, options: &[TelnetOption]) {
        for opt in options {
            self.local.entry(opt.code()).or_insert(false);
            self.remote.entry(opt.code()).or_insert(false);
        }
    }

    pub fn set_local(&mut self, option: TelnetOption, enabled: bool) {
        self.local.insert(option.code(), enabled);
        self.pending_local.remove(&option.code());
    }

    pub fn set_remote(&mut self, option: TelnetOption, enabled: bool) {
        self.remote.insert(option.code(), enabled);
        self.pending_remote.remove(&option.code());
    }

    pub fn mark_pending_local(&mut self, option: TelnetOption) {
        self.pending_local.insert(option.code());
    }

    pub fn mark_pending_remote(&mut self, option: TelnetOption) {
        self.pending_remote.insert(option.code());
    }

    pub fn is_local_enabled(&self, option: TelnetOption) -> bool {
        self.local.get(&option.code()).copied().unwrap_or(false)
    }

    pub fn is_remote_enabled(&self, option: TelnetOption) -> bool {
        self.remote.get(&option.code()).copied().unwrap_or(false)
    }

    pub fn is_local_pending(&self, option: TelnetOption) -> bool {
        self.pending_local.contains(&option.code())
    }

    pub fn is_remote_pending(&self, option: TelnetOption) -> bool {
        self.pending_remote.contains(&option.code())
    }

    /// `"<NAME>: local=enabled|disabled, remote=enabled|disabled"`.
    pub fn status(&self, option: TelnetOption) -> String {
        format!(
            "{}: local={}, remote={}",
            option.name(),
            bool_word(self.is_local_enabled(option)),
            bool_word(self.is_remote_enabled(option)),
        )
    }
}

fn bool_word(b: bool) -> &'static str {
    if b {
        "enabled"
    } else {
        "disabled"
    }
}

impl fmt::Display for OptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OptionRegistry(local={:?}, remote={:?})",
            self.local, self.remote
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST1: u8 = 42;
    const TEST2: u8 = 43;

    #[test]
    fn initial_state_is_empty() {
        let reg = OptionRegistry::new();
        assert!(!reg.is_local_enabled(TelnetOption::Unknown(TEST1)));
        assert!(!reg.is_local_pending(TelnetOption::Unknown(TEST1)));
        assert!(!reg.is_remote_pending(TelnetOption::Unknown(TEST1)));
    }

    #[test]
    fn initialize_seeds_disabled() {
        let mut reg = OptionRegistry::new();
        reg.initialize(&[TelnetOption::Unknown(TEST1), TelnetOption::Unknown(TEST2)]);
        assert!(!reg.is_local_enabled(TelnetOption::Unknown(TEST1)));
        assert!(!reg.is_remote_enabled(TelnetOption::Unknown(TEST2)));
    }

    #[test]
    fn set_local_clears_pending() {
        let mut reg = OptionRegistry::new();
        reg.mark_pending_local(TelnetOption::Unknown(TEST1));
        assert!(reg.is_local_pending(TelnetOption::Unknown(TEST1)));
        reg.set_local(TelnetOption::Unknown(TEST1), true);
        assert!(reg.is_local_enabled(TelnetOption::Unknown(TEST1)));
        assert!(!reg.is_local_pending(TelnetOption::Unknown(TEST1)));
    }

    #[test]
    fn set_remote_clears_pending() {
        let mut reg = OptionRegistry::new();
        reg.mark_pending_remote(TelnetOption::Unknown(TEST2));
        assert!(reg.is_remote_pending(TelnetOption::Unknown(TEST2)));
        reg.set_remote(TelnetOption::Unknown(TEST2), true);
        assert!(reg.is_remote_enabled(TelnetOption::Unknown(TEST2)));
        assert!(!reg.is_remote_pending(TelnetOption::Unknown(TEST2)));
    }

    #[test]
    fn option_status_format() {
        let mut reg = OptionRegistry::new();
        reg.initialize(&[TelnetOption::Unknown(TEST1)]);
        reg.set_local(TelnetOption::Unknown(TEST1), true);
        assert_eq!(
            reg.status(TelnetOption::Unknown(TEST1)),
            "UNKNOWN-OPTION-42: local=enabled, remote=disabled"
        );
    }

    #[test]
    fn display_contains_maps() {
        let mut reg = OptionRegistry::new();
        reg.initialize(&[TelnetOption::Unknown(TEST1)]);
        reg.set_local(TelnetOption::Unknown(TEST1), true);
        let rep = format!("{reg}");
        assert!(rep.contains("local="));
        assert!(rep.contains("remote="));
        assert!(rep.contains(&TEST1.to_string()));
    }
}
