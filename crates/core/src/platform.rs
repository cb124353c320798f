//! Platform detection
//!
//! Provides OS information using standard Unix conventions:
//! - macOS → `"darwin"` (kernel name)
//! - Linux → `"linux"`
//! - Windows → `"windows"`
//!
//! Windows is the only platform whose filesystem paths compare
//! case-insensitively, which affects workspace-root checks and the matching
//! of status records back to the files that requested them.

use std::sync::LazyLock;

/// Current platform information (cached)
pub static CURRENT_PLATFORM: LazyLock<Platform> = LazyLock::new(Platform::detect);

/// Platform information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// OS: "darwin" (macOS), "linux", "windows", "unknown"
    pub os: &'static str,
    /// CPU architecture: "x86_64", "aarch64", etc.
    pub arch: &'static str,
    /// Whether local paths compare case-insensitively
    pub case_insensitive_paths: bool,
}

impl Platform {
    pub fn detect() -> Self {
        let os = Self::detect_os();
        Self {
            os,
            arch: std::env::consts::ARCH,
            case_insensitive_paths: os == "windows",
        }
    }

    /// Whether this is Windows
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    const fn detect_os() -> &'static str {
        #[cfg(target_os = "macos")]
        {
            "darwin"
        }

        #[cfg(target_os = "linux")]
        {
            "linux"
        }

        #[cfg(target_os = "windows")]
        {
            "windows"
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            "unknown"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitivity_follows_os() {
        let platform = Platform::detect();
        assert_eq!(platform.case_insensitive_paths, platform.is_windows());
    }

    #[test]
    fn test_current_platform_is_cached_detection() {
        assert_eq!(*CURRENT_PLATFORM, Platform::detect());
    }
}
