//! XDG directory utilities
//!
//! - `XDG_CONFIG_HOME` defaults to ~/.config

use std::path::PathBuf;
use xdg::BaseDirectories;

/// Get the p4gate config directory
///
/// Returns `$XDG_CONFIG_HOME/p4gate` or `~/.config/p4gate`
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    BaseDirectories::with_prefix("p4gate").get_config_home()
}

/// Get the default config file path
///
/// Returns `$XDG_CONFIG_HOME/p4gate/config.toml`
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    #[allow(unsafe_code)]
    fn test_config_dir_honours_xdg_config_home() {
        let temp = tempfile::tempdir().unwrap();
        let previous = std::env::var_os("XDG_CONFIG_HOME");
        // SAFETY: serialised with other env-mutating tests
        unsafe { std::env::set_var("XDG_CONFIG_HOME", temp.path()) };

        let dir = config_dir();

        match previous {
            Some(value) => unsafe { std::env::set_var("XDG_CONFIG_HOME", value) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        assert_eq!(dir, Some(temp.path().join("p4gate")));
    }

    #[test]
    fn test_default_config_file_ends_with_config_toml() {
        if let Some(path) = default_config_file() {
            assert!(path.ends_with("p4gate/config.toml"), "{path:?}");
        }
    }
}
