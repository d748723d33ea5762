//! Local release tags and reconciliation against incoming refs.
//!
//! - [`version`]: strict version grammar and ordering
//! - [`inspector`]: reading tags from a checkout with `git tag`
//! - [`decision`]: comparing the newest local tag with an incoming ref

pub mod decision;
pub mod inspector;
pub mod version;

pub use decision::{Reconciliation, decide};
pub use inspector::{
    GitTagInspector, TagInspectionError, TagSource, list_sorted_tags, sorted_tags_from_output,
};
pub use version::{PreRelease, PreReleaseKind, TagVersion, VersionParseError};
