use std::{
    io::{ErrorKind, SeekFrom},
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use super::{LastBookingStore, LAST_BOOKING_FILE};

#[derive(Debug, Serialize, Deserialize)]
struct LastBookingEntity {
    last_booking: DateTime<Utc>,
}

/// The main realization of [LastBookingStore]. A single small json file guarded by advisory
/// locks, so `mocotray book` and the daemon can share it.
pub struct FileTimestampStore {
    path: PathBuf,
}

impl FileTimestampStore {
    pub fn new(dir: &Path) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(dir)?;

        Ok(Self {
            path: dir.join(LAST_BOOKING_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Option<DateTime<Utc>> {
        if content.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<LastBookingEntity>(content) {
            Ok(v) => Some(v.last_booking),
            Err(e) => {
                warn!("Found illegal last booking data in {:?}: {e}", self.path);
                None
            }
        }
    }
}

#[async_trait]
impl LastBookingStore for FileTimestampStore {
    async fn load(&self) -> Result<Option<DateTime<Utc>>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e)?,
        };

        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        Ok(self.parse(&content))
    }

    async fn record(&self, at: DateTime<Utc>) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        file.lock_exclusive()?;

        async fn replace(store: &FileTimestampStore, file: &mut File, at: DateTime<Utc>) -> Result<()> {
            let mut content = String::new();
            file.read_to_string(&mut content).await?;

            if let Some(existing) = store.parse(&content) {
                if existing >= at {
                    debug!("Keeping later booking time {existing}");
                    return Ok(());
                }
            }

            let data = serde_json::to_vec(&LastBookingEntity { last_booking: at })?;
            file.set_len(0).await?;
            file.seek(SeekFrom::Start(0)).await?;
            file.write_all(&data).await?;
            file.flush().await?;
            file.sync_data().await?;
            Ok(())
        }

        let result = replace(self, &mut file, at).await;
        file.unlock_async().await?;
        result
    }
}
