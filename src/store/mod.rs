//! The two JSON ledgers mirroring the package manifests, plus the workspace
//! layout that owns them.
//!
//! Single-writer model: every document is read in full, mutated in memory,
//! and written back in full. Two bump/fix invocations must never interleave
//! against the same workspace — there is no file locking by design.

pub mod meta;
pub mod versions;
pub mod workspace;

pub use meta::{Meta, MetaPackage};
pub use versions::{PackageInfo, Versions};
pub use workspace::Workspace;

/// `prefix@old -> prefix@new` strings for every package whose latest history
/// entry differs from meta's current record.
///
/// Feeds the "Updated packages" list of the global release changelog.
pub fn updated_versions(meta: &Meta, versions: &Versions) -> Vec<String> {
    meta.packages
        .iter()
        .filter_map(|package| {
            let latest = versions.latest_of(&package.prefix)?;
            if latest.version != package.version {
                Some(format!(
                    "{}{} -> {}{}",
                    package.prefix, package.version, package.prefix, latest.version
                ))
            } else {
                None
            }
        })
        .collect()
}
