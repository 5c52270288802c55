//! Domain logic - pure business rules independent of git and filesystem state

pub mod commit;
pub mod semver;
pub mod tag;

pub use commit::{CommitRecord, Organized, ParsedCommit, ParsedCommits};
pub use semver::BumpType;
pub use tag::TagParts;
