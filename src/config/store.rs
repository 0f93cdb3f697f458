//! Configuration persistence
//!
//! A JSON file on disk plus a lock-free in-memory cache. Reads never
//! block; updates rewrite the file first and swap the cache after, so a
//! crash mid-update leaves the previous document intact on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use super::schema::AppConfig;
use crate::error::Result;

/// Configuration store backed by a JSON file
pub struct ConfigStore {
    path: PathBuf,
    cache: ArcSwap<AppConfig>,
}

impl ConfigStore {
    /// Open the store, creating the file with defaults when it does not
    /// exist yet.
    pub async fn new(path: &Path) -> Result<Self> {
        let config = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                Self::persist(path, &config).await?;
                info!("created default configuration at {}", path.display());
                config
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            cache: ArcSwap::from_pointee(config),
        })
    }

    /// Get the current configuration (lock-free)
    pub fn get(&self) -> Arc<AppConfig> {
        self.cache.load_full()
    }

    /// Apply a mutation and persist it.
    pub async fn update(&self, f: impl FnOnce(&mut AppConfig)) -> Result<()> {
        let mut config = (*self.get()).clone();
        f(&mut config);

        // Persist first, then swap the cache atomically
        Self::persist(&self.path, &config).await?;
        self.cache.store(Arc::new(config));

        Ok(())
    }

    async fn persist(path: &Path, config: &AppConfig) -> Result<()> {
        let json = serde_json::to_vec_pretty(config)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_store() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("facelink.json");

        let store = ConfigStore::new(&config_path).await.unwrap();

        // Check default config
        let config = store.get();
        assert_eq!(config.video.width, 640);
        assert_eq!(config.webrtc.codec_filter.as_deref(), Some("H264/90000"));

        // Update config
        store
            .update(|c| {
                c.video.width = 1280;
                c.server.offer_url = "http://10.0.0.2:8080/offer".to_string();
            })
            .await
            .unwrap();

        // Verify update
        let config = store.get();
        assert_eq!(config.video.width, 1280);
        assert_eq!(config.server.offer_url, "http://10.0.0.2:8080/offer");

        // Create new store instance and verify persistence
        let store2 = ConfigStore::new(&config_path).await.unwrap();
        let config = store2.get();
        assert_eq!(config.video.width, 1280);
        assert_eq!(config.server.offer_url, "http://10.0.0.2:8080/offer");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error_not_a_reset() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("facelink.json");
        tokio::fs::write(&config_path, b"{not json").await.unwrap();

        assert!(ConfigStore::new(&config_path).await.is_err());
    }
}
