//! Where the app is running, as far as persistence is concerned.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser shell: no native filesystem, downloads only.
    Web,
    /// Native shell with the gallery plugin.
    Android,
    Ios,
    /// Native desktop shell. Takes the same tiers as iOS.
    Desktop,
}

impl Platform {
    /// Running inside a native application shell.
    pub fn is_native(self) -> bool {
        !matches!(self, Platform::Web)
    }

    pub fn is_android(self) -> bool {
        matches!(self, Platform::Android)
    }

    /// The platform this binary was built for.
    pub fn detect() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_family = "wasm") {
            Platform::Web
        } else {
            Platform::Desktop
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
