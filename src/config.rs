use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SonglibConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    pub external_api: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("songlib.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("songlib.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SonglibConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: SonglibConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SonglibConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songlib.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());
    }

    #[test]
    fn write_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songlib.toml");

        let config = SonglibConfig {
            database: Some("songs.db".to_string()),
            port: Some(8080),
            external_api: Some("http://localhost:9000".to_string()),
        };
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database.as_deref(), Some("songs.db"));
        assert_eq!(loaded.port, Some(8080));

        // A second write without force is refused.
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();
    }
}
