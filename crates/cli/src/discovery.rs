//! Plugin location resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use conch_core::LocationSet;

/// Environment variable holding extra plugin locations.
pub const PLUGIN_PATH_ENV: &str = "CONCH_PLUGIN_PATH";

/// Where the locations of a session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationOrigin {
    Arguments,
    Environment,
    DefaultDir,
    Nowhere,
}

impl LocationOrigin {
    /// Short human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            LocationOrigin::Arguments => "command line",
            LocationOrigin::Environment => PLUGIN_PATH_ENV,
            LocationOrigin::DefaultDir => "default plugin directory",
            LocationOrigin::Nowhere => "no locations",
        }
    }
}

/// Resolves the locations to search, first non-empty source wins:
/// command-line arguments, then `CONCH_PLUGIN_PATH`, then the default
/// plugin directory if it exists.
pub fn resolve_locations(args: Vec<PathBuf>) -> (LocationSet, LocationOrigin) {
    resolve_locations_from(
        args,
        std::env::var_os(PLUGIN_PATH_ENV),
        default_plugin_dir().as_deref(),
    )
}

/// Resolves locations from explicit sources.
pub fn resolve_locations_from(
    args: Vec<PathBuf>,
    env_value: Option<OsString>,
    default_dir: Option<&Path>,
) -> (LocationSet, LocationOrigin) {
    if !args.is_empty() {
        return (LocationSet::new(args), LocationOrigin::Arguments);
    }

    if let Some(value) = env_value {
        let paths: Vec<PathBuf> = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !paths.is_empty() {
            return (LocationSet::new(paths), LocationOrigin::Environment);
        }
    }

    match default_dir {
        Some(dir) if dir.is_dir() => (LocationSet::new([dir]), LocationOrigin::DefaultDir),
        _ => (LocationSet::default(), LocationOrigin::Nowhere),
    }
}

/// Returns the default plugin directory (`<data dir>/conch/plugins`).
pub fn default_plugin_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("conch").join("plugins"))
}
