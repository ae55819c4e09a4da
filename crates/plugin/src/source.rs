//! Turns plugin locations into manifests and module bytes.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::archive;
use crate::error::{PluginError, Result};
use crate::manifest::{PLUGIN_MANIFEST_FILE_NAME, PluginManifest};

/// A validated manifest together with the module it points at.
#[derive(Debug)]
pub(crate) struct PluginBundle {
    /// Where the manifest was read from, for diagnostics.
    pub origin: PathBuf,

    pub manifest: PluginManifest,

    /// WASM binary or WAT text.
    pub module_bytes: Vec<u8>,
}

/// Outcome of loading one manifest; failures carry the path they concern.
pub(crate) type BundleResult = std::result::Result<PluginBundle, (PathBuf, PluginError)>;

/// Loads every plugin reachable from one location.
///
/// A directory is walked recursively in file-name order, a `.json` file is
/// read as a single manifest, and a `.zip` file is read as an archive. One
/// bad manifest never hides its siblings.
pub(crate) fn load_location(location: &Path) -> Vec<BundleResult> {
    if !location.exists() {
        return vec![Err((
            location.to_path_buf(),
            PluginError::NotFound(location.to_path_buf()),
        ))];
    }

    if location.is_dir() {
        return load_directory(location);
    }

    match extension(location).as_deref() {
        Some("json") => {
            vec![load_manifest_file(location).map_err(|e| (location.to_path_buf(), e))]
        }
        Some("zip") => match archive::load_archive(location) {
            Ok(bundles) => bundles,
            Err(err) => vec![Err((location.to_path_buf(), err))],
        },
        _ => vec![Err((
            location.to_path_buf(),
            PluginError::UnsupportedLocation(location.to_path_buf()),
        ))],
    }
}

fn load_directory(root: &Path) -> Vec<BundleResult> {
    let mut bundles = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                bundles.push(Err((path, err.into())));
                continue;
            }
        };

        if entry.file_type().is_file() && entry.file_name() == PLUGIN_MANIFEST_FILE_NAME {
            debug!(manifest = %entry.path().display(), "found plugin manifest");
            let loaded = load_manifest_file(entry.path());
            bundles.push(loaded.map_err(|e| (entry.path().to_path_buf(), e)));
        }
    }

    bundles
}

fn load_manifest_file(path: &Path) -> Result<PluginBundle> {
    let manifest = PluginManifest::from_file(path)?;
    manifest.validate()?;

    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let wasm_path = root.join(manifest.plugin.wasm.trim());
    let module_bytes = std::fs::read(&wasm_path).map_err(|e| PluginError::LoadError {
        path: wasm_path.clone(),
        reason: e.to_string(),
    })?;

    Ok(PluginBundle {
        origin: path.to_path_buf(),
        manifest,
        module_bytes,
    })
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|v| v.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn write_manifest(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(PLUGIN_MANIFEST_FILE_NAME), body).unwrap();
    }

    const VALID: &str = r#"{
        "plugin": { "name": "demo", "version": "1.0.0", "wasm": "demo.wat" },
        "commands": [ { "id": "run" } ]
    }"#;

    #[test]
    fn test_missing_location() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let results = load_location(&missing);
        assert_eq!(results.len(), 1);
        let (path, err) = results.into_iter().next().unwrap().unwrap_err();
        assert_eq!(path, missing);
        assert!(matches!(err, PluginError::NotFound(_)));
    }

    #[test]
    fn test_unsupported_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();

        let (_, err) = load_location(&file).pop().unwrap().unwrap_err();
        assert!(matches!(err, PluginError::UnsupportedLocation(_)));
    }

    #[test]
    fn test_directory_walk_is_sorted_and_nested() {
        let dir = tempdir().unwrap();
        for name in ["zeta", "alpha", "nested/beta"] {
            let plugin_dir = dir.path().join(name);
            write_manifest(&plugin_dir, VALID);
            fs::write(plugin_dir.join("demo.wat"), "(module)").unwrap();
        }

        let origins: Vec<_> = load_location(dir.path())
            .into_iter()
            .map(|r| r.unwrap().origin)
            .collect();

        assert_eq!(
            origins,
            vec![
                dir.path().join("alpha").join(PLUGIN_MANIFEST_FILE_NAME),
                dir.path().join("nested/beta").join(PLUGIN_MANIFEST_FILE_NAME),
                dir.path().join("zeta").join(PLUGIN_MANIFEST_FILE_NAME),
            ]
        );
    }

    #[test]
    fn test_bad_manifest_does_not_hide_siblings() {
        let dir = tempdir().unwrap();
        write_manifest(&dir.path().join("broken"), "{ nope");
        let good = dir.path().join("good");
        write_manifest(&good, VALID);
        fs::write(good.join("demo.wat"), "(module)").unwrap();

        let results = load_location(dir.path());
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err((_, PluginError::ManifestError(_)))));
        assert_eq!(results[1].as_ref().unwrap().manifest.plugin.name, "demo");
    }

    #[test]
    fn test_manifest_file_location_with_missing_module() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), VALID);

        let (path, err) = load_location(&dir.path().join(PLUGIN_MANIFEST_FILE_NAME))
            .pop()
            .unwrap()
            .unwrap_err();
        assert_eq!(path, dir.path().join(PLUGIN_MANIFEST_FILE_NAME));
        assert!(err.to_string().contains("demo.wat"));
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(load_location(dir.path()).is_empty());
    }
}
