//! Command-level operations composing the domain, backends, and store.

pub mod bump;
pub mod changelog;
pub mod fix;
pub mod init;
pub mod release;
pub mod tag;

pub use bump::{BumpContext, BumpPhase, BumpReport, BumpTransaction};
pub use fix::{DetectedIssues, FixSummary, PathIssueKind};
pub use release::{ReleaseOptions, ReleaseReport};
