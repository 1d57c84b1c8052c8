//! npm manifests and Node module resolution

pub mod gather;
mod manifest;
mod resolve;
mod wildcard;

pub use gather::{gather_versions, parse_args, reset_requested, GatherReport, GatherRequest};
pub use manifest::{manifest_path, PackageJson, MANIFEST_FILE};
pub use resolve::{installed_version, resolve_manifest};
pub use wildcard::WildcardResolver;
