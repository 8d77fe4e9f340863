use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Seed {
    /// Directory holding users.json, profiles.json, ...; the bundled set is
    /// used when empty
    pub fixtures_dir: String,
    /// Associate seeded records by position
    pub link: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub seed: Seed,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Optional settings.toml
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Workspace root during development
        let dev_path = PathBuf::from("chatter-seed").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        // 2. Defaults, then environment variables (highest priority)
        builder = builder
            .set_default("database.path", "chatter.db")?
            .set_default("seed.fixtures_dir", "")?
            .set_default("seed.link", true)?;

        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(dir) = std::env::var("FIXTURES_DIR") {
            builder = builder.set_override("seed.fixtures_dir", dir)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    pub fn fixtures_dir(&self) -> Option<PathBuf> {
        let dir = self.seed.fixtures_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}
