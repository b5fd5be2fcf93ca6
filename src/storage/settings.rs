use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::Credentials;

use super::SETTINGS_FILE;

/// Credentials as entered with `mocotray setup`. The file holds the api key, so it's only
/// readable by the owner on unix.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing settings are not an error, the empty credentials fail validation later with a
    /// message that tells the user to run setup.
    pub async fn load(&self) -> Result<Credentials> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse settings {:?}", self.path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Credentials::default()),
            Err(e) => Err(e).context("Failed to read settings"),
        }
    }

    pub async fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(credentials)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(&content).await?;
        file.flush().await?;

        info!("Saved settings for domain {}", credentials.domain);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::config::Credentials;

    use super::SettingsStore;

    #[tokio::test]
    async fn test_missing_settings_are_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::new(dir.path());

        let credentials = store.load().await?;
        assert_eq!(credentials, Credentials::default());
        assert!(credentials.endpoint().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_load() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::new(&dir.path().join("nested"));
        let credentials = Credentials::new("acme", "secret");

        store.save(&credentials).await?;
        assert_eq!(store.load().await?, credentials);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path())?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        Ok(())
    }
}
