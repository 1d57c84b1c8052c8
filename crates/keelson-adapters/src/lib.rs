//! Keelson Adapters - npm and Yarn integration
//!
//! Reading and rewriting `package.json` files, resolving installed
//! dependency versions through `node_modules`, and driving Yarn installs.

pub mod npm;
pub mod yarn;

pub use npm::{PackageJson, WildcardResolver};
pub use yarn::YarnInstaller;
