//! Init command: create the data directory and database.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let _db = stint_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    writeln!(writer, "Initialized database at {}", config.database_path.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_database_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("nested/stint.db"),
            ..Config::default()
        };
        let mut output = Vec::new();
        run(&mut output, &config).unwrap();
        assert!(config.database_path.exists());
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Initialized database at "));
    }
}
