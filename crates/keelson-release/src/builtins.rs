//! Builtin task steps provided by the release crate

use std::path::Path;

use indexmap::IndexMap;
use keelson_core::error::{ReleaseError, Result};
use keelson_tasks::BuiltinRunner;
use tracing::debug;

use crate::bump::{bump, unbump, BumpOptions};
use crate::pipeline::{BUMP_BUILTIN, UNBUMP_BUILTIN};

/// Runs `bump` and `unbump` steps.
///
/// Values from the step environment win over the process environment, so a
/// root task can set `MAJOR` for every package while each package task
/// sets its own files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseBuiltins;

impl ReleaseBuiltins {
    fn lookup(env: &IndexMap<String, String>, key: &str) -> Option<String> {
        env.get(key).cloned().or_else(|| std::env::var(key).ok())
    }
}

impl BuiltinRunner for ReleaseBuiltins {
    fn run_builtin(&self, name: &str, cwd: &Path, env: &IndexMap<String, String>) -> Result<()> {
        debug!(builtin = name, cwd = %cwd.display(), "running builtin");
        match name {
            BUMP_BUILTIN => {
                let options = BumpOptions::from_lookup(|key| Self::lookup(env, key))?;
                bump(cwd, &options)?;
                Ok(())
            }
            UNBUMP_BUILTIN => {
                let outfile = Self::lookup(env, "OUTFILE").ok_or_else(|| ReleaseError::MissingEnv("OUTFILE".to_string()))?;
                unbump(cwd, &outfile)
            }
            other => Err(ReleaseError::TaskFailed {
                task: other.to_string(),
                reason: "unknown builtin".to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_adapters::npm::PackageJson;
    use tempfile::TempDir;

    #[test]
    fn test_unbump_builtin() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "{\"name\": \"one\", \"version\": \"1.2.3\"}\n").unwrap();

        let mut env = IndexMap::new();
        env.insert("OUTFILE".to_string(), "package.json".to_string());
        ReleaseBuiltins.run_builtin(UNBUMP_BUILTIN, temp.path(), &env).unwrap();

        let manifest = PackageJson::load(&temp.path().join("package.json")).unwrap();
        assert_eq!(manifest.version(), Some("0.0.0"));
    }

    #[test]
    fn test_unknown_builtin() {
        let temp = TempDir::new().unwrap();
        let err = ReleaseBuiltins
            .run_builtin("publish", temp.path(), &IndexMap::new())
            .unwrap_err();
        assert!(err.to_string().contains("unknown builtin"));
    }
}
