use std::path::{Path, PathBuf};

use market::Sample;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::PriceLogError;
use crate::messages::timestamp;

/// Append-only `timestamp,price` file, one line per successful sample.
///
/// Never rotated or truncated here.
#[derive(Clone, Debug)]
pub struct PriceLog {
    path: PathBuf,
}

impl PriceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(sample: &Sample) -> String {
        format!("{},{:.2}\n", timestamp(&sample.at), sample.price)
    }

    pub async fn append(&self, sample: &Sample) -> Result<(), PriceLogError> {
        let io_err = |source| PriceLogError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;

        file.write_all(Self::line(sample).as_bytes())
            .await
            .map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn appends_one_line_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let log = PriceLog::new(dir.path().join("prices.log"));

        let t = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        log.append(&Sample::new(t, 3312.456)).await.unwrap();
        log.append(&Sample::new(t, 1.0)).await.unwrap();

        let content = tokio::fs::read_to_string(log.path()).await.unwrap();
        assert_eq!(
            content,
            "2025-01-02T03:04:05Z,3312.46\n2025-01-02T03:04:05Z,1.00\n"
        );
    }

    #[tokio::test]
    async fn unwritable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let log = PriceLog::new(dir.path().join("missing").join("prices.log"));

        let err = log.append(&Sample::now(1.0)).await.unwrap_err();
        assert!(err.to_string().contains("prices.log"));
    }
}
