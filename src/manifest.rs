//! Package manifest access.
//!
//! `package.json` belongs to the surrounding project; the engine only ever
//! reads the `version` field and patches it in place, re-serializing with the
//! same 2-space layout and trailing newline the ecosystem writes.

use semver::Version;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{NyronError, Result};

fn manifest_path(dir: &Path) -> PathBuf {
    dir.join("package.json")
}

/// Does the directory contain a `package.json` at all?
pub fn manifest_exists(dir: &Path) -> bool {
    manifest_path(dir).is_file()
}

fn read_document(dir: &Path) -> Result<Value> {
    let path = manifest_path(dir);
    let raw = fs::read_to_string(&path)
        .map_err(|e| NyronError::invalid_manifest(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| NyronError::invalid_manifest(format!("{}: {}", path.display(), e)))
}

/// Read the manifest's `version` field.
pub fn read_version(dir: &Path) -> Result<String> {
    let document = read_document(dir)?;
    document
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            NyronError::invalid_manifest(format!(
                "{} has no string 'version' field",
                manifest_path(dir).display()
            ))
        })
}

/// Read the `version` field and require it to be valid semver.
pub fn read_semver_version(dir: &Path) -> Result<String> {
    let version = read_version(dir)?;
    if Version::parse(&version).is_err() {
        return Err(NyronError::invalid_manifest(format!(
            "{} has non-semver version '{}'",
            manifest_path(dir).display(),
            version
        )));
    }
    Ok(version)
}

/// Is the manifest readable JSON with a string `version` field?
pub fn validate(dir: &Path) -> bool {
    read_version(dir).is_ok()
}

/// Patch the `version` field in place, preserving every other field.
pub fn write_version(dir: &Path, version: &str) -> Result<()> {
    let mut document = read_document(dir)?;
    match &mut document {
        Value::Object(map) => {
            map.insert("version".to_string(), Value::String(version.to_string()));
        }
        _ => {
            return Err(NyronError::invalid_manifest(format!(
                "{} is not a JSON object",
                manifest_path(dir).display()
            )))
        }
    }
    write_document(dir, &document)
}

/// Write a minimal manifest, creating the directory when needed.
///
/// Used by the consistency auditor when the user approves creating a missing
/// package.
pub fn create_manifest(dir: &Path, name: &str, version: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    let document = serde_json::json!({
        "name": name,
        "version": version,
    });
    write_document(dir, &document)
}

fn write_document(dir: &Path, document: &Value) -> Result<()> {
    let mut content = serde_json::to_string_pretty(document)?;
    content.push('\n');
    fs::write(manifest_path(dir), content)?;
    Ok(())
}
