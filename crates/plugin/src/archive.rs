//! Plugins packaged as `.zip` archives.
//!
//! The archive is read into memory; nothing is extracted to disk. Each
//! `plugin.json` entry resolves its module relative to its own directory
//! inside the archive.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::error::{PluginError, Result};
use crate::manifest::{PLUGIN_MANIFEST_FILE_NAME, PluginManifest};
use crate::source::{BundleResult, PluginBundle};

/// Loads every plugin declared inside an archive.
///
/// Fails as a whole only if the archive itself cannot be read.
pub(crate) fn load_archive(archive_path: &Path) -> Result<Vec<BundleResult>> {
    let files = read_entries(archive_path)?;

    let bundles = files
        .keys()
        .filter(|name| file_name(name) == PLUGIN_MANIFEST_FILE_NAME)
        .map(|name| {
            let origin = archive_path.join(name);
            bundle_from_entry(name, &files, origin.clone()).map_err(|e| (origin, e))
        })
        .collect();

    Ok(bundles)
}

fn bundle_from_entry(
    manifest_name: &str,
    files: &BTreeMap<String, Vec<u8>>,
    origin: PathBuf,
) -> Result<PluginBundle> {
    let raw = std::str::from_utf8(&files[manifest_name])
        .map_err(|e| PluginError::ManifestError(e.to_string()))?;
    let manifest = PluginManifest::from_json(raw)?;
    manifest.validate()?;

    let wasm_name = sibling(manifest_name, manifest.plugin.wasm.trim());
    let module_bytes = files
        .get(&wasm_name)
        .cloned()
        .ok_or_else(|| PluginError::LoadError {
            path: origin.clone(),
            reason: format!("archive has no entry `{}`", wasm_name),
        })?;

    Ok(PluginBundle {
        origin,
        manifest,
        module_bytes,
    })
}

fn read_entries(archive_path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let buf = std::fs::read(archive_path)?;
    let archive = rawzip::ZipArchive::from_slice(&buf).map_err(|e| {
        PluginError::ArchiveError(format!("{}: {:?}", archive_path.display(), e))
    })?;

    let mut files = BTreeMap::new();
    for entry in archive.entries() {
        let entry =
            entry.map_err(|e| PluginError::ArchiveError(format!("zip entry error: {:?}", e)))?;
        let filename = entry
            .file_path()
            .try_normalize()
            .map_err(|e| {
                PluginError::ArchiveError(format!("failed to normalize zip path: {:?}", e))
            })?
            .as_ref()
            .to_string();

        let path = Path::new(&filename);
        if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(PluginError::ArchiveError(format!(
                "unsupported path in zip: {}",
                filename
            )));
        }
        if entry.is_dir() {
            continue;
        }

        let wayfinder = entry.wayfinder();
        let slice_entry = archive.get_entry(wayfinder).map_err(|e| {
            PluginError::ArchiveError(format!("failed to get entry data: {:?}", e))
        })?;
        let data = slice_entry.data();

        let contents = match entry.compression_method() {
            rawzip::CompressionMethod::Store => data.to_vec(),
            rawzip::CompressionMethod::Deflate => {
                let mut out = Vec::new();
                flate2::read::DeflateDecoder::new(data).read_to_end(&mut out)?;
                out
            }
            other => {
                return Err(PluginError::ArchiveError(format!(
                    "unsupported compression for {}: {:?}",
                    filename, other
                )));
            }
        };

        files.insert(filename, contents);
    }

    Ok(files)
}

fn file_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Resolves `relative` against the directory holding `entry`.
fn sibling(entry: &str, relative: &str) -> String {
    let dir = entry.rsplit_once('/').map(|(dir, _)| dir);
    let parts = dir
        .into_iter()
        .flat_map(|d| d.split('/'))
        .chain(relative.split(['/', '\\']))
        .filter(|part| !part.is_empty() && *part != ".");

    parts.collect::<Vec<_>>().join("/")
}
