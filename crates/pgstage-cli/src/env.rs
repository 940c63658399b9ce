use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Name of the env file for an optional environment (`.env` or `.env.{ENV}`).
pub fn env_file_name(env: Option<&str>) -> String {
    match env {
        Some(name) => format!(".env.{}", name),
        None => ".env".to_string(),
    }
}

/// Find `file_name` in `start` or the nearest ancestor directory.
fn find_in_ancestors(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|path| path.exists())
}

/// Load the env file from the current directory or any parent directory.
///
/// Without an environment, a missing `.env` is fine: variables may come from
/// the process environment. A named environment must have its file.
pub fn load_dotenv_from_ancestors(env: Option<&str>) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let file_name = env_file_name(env);

    let Some(env_path) = find_in_ancestors(&cwd, &file_name) else {
        if env.is_some() {
            anyhow::bail!(
                "No {} file found.\n\n\
                Searched from {} to filesystem root.",
                file_name,
                cwd.display()
            );
        }
        debug!("No .env file found, using process environment");
        return Ok(());
    };

    dotenvy::from_path(&env_path)
        .with_context(|| format!("Failed to load {}", env_path.display()))?;
    info!("Loaded {}", env_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    /// Run `f` with the working directory set to `dir`.
    fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let out = f();
        std::env::set_current_dir(original_dir).unwrap();
        out
    }

    #[test]
    fn test_env_file_name() {
        assert_eq!(env_file_name(None), ".env");
        assert_eq!(env_file_name(Some("prod")), ".env.prod");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_from_parent_directory() {
        let parent_dir = TempDir::new().unwrap();
        let child_dir = parent_dir.path().join("subdir");
        fs::create_dir(&child_dir).unwrap();
        fs::write(parent_dir.path().join(".env"), "PGSTAGE_TEST_PARENT=world").unwrap();
        std::env::remove_var("PGSTAGE_TEST_PARENT");

        let result = in_dir(&child_dir, || load_dotenv_from_ancestors(None));

        assert!(result.is_ok());
        assert_eq!(std::env::var("PGSTAGE_TEST_PARENT").unwrap(), "world");
        std::env::remove_var("PGSTAGE_TEST_PARENT");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_prefers_closest_env_file() {
        let parent_dir = TempDir::new().unwrap();
        let child_dir = parent_dir.path().join("subdir");
        fs::create_dir(&child_dir).unwrap();
        fs::write(parent_dir.path().join(".env"), "PGSTAGE_TEST_CLOSEST=parent").unwrap();
        fs::write(child_dir.join(".env"), "PGSTAGE_TEST_CLOSEST=child").unwrap();
        std::env::remove_var("PGSTAGE_TEST_CLOSEST");

        in_dir(&child_dir, || load_dotenv_from_ancestors(None)).unwrap();

        assert_eq!(std::env::var("PGSTAGE_TEST_CLOSEST").unwrap(), "child");
        std::env::remove_var("PGSTAGE_TEST_CLOSEST");
    }

    #[test]
    #[serial]
    fn test_named_environment_loads_its_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".env"), "PGSTAGE_TEST_ENV=default").unwrap();
        fs::write(temp_dir.path().join(".env.staging"), "PGSTAGE_TEST_ENV=staging").unwrap();
        std::env::remove_var("PGSTAGE_TEST_ENV");

        in_dir(temp_dir.path(), || load_dotenv_from_ancestors(Some("staging"))).unwrap();

        assert_eq!(std::env::var("PGSTAGE_TEST_ENV").unwrap(), "staging");
        std::env::remove_var("PGSTAGE_TEST_ENV");
    }

    #[test]
    #[serial]
    fn test_missing_default_env_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = in_dir(temp_dir.path(), || load_dotenv_from_ancestors(None));
        assert!(result.is_ok());
    }

    #[test]
    #[serial]
    fn test_missing_named_env_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = in_dir(temp_dir.path(), || load_dotenv_from_ancestors(Some("nowhere")))
            .unwrap_err();
        assert!(err.to_string().contains("No .env.nowhere file found"));
    }
}
