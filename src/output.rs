//! JSON Lines output.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes one JSON object per line to a file or stdout.
pub struct JsonLinesSink {
    writer: BufWriter<Box<dyn AsyncWrite + Send + Unpin>>,
    written: u64,
}

impl JsonLinesSink {
    /// Create (or truncate) `path`, making parent directories as needed.
    pub async fn create(path: &Path) -> Result<Self, OutputError> {
        let open_error = |source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(open_error)?;
        }
        let file = tokio::fs::File::create(path).await.map_err(open_error)?;
        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn stdout() -> Self {
        Self::from_writer(Box::new(tokio::io::stdout()))
    }

    fn from_writer(writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    pub async fn write<T: Serialize>(&mut self, value: &T) -> Result<(), OutputError> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingRecord, ListingSummary};
    use tempfile::tempdir;

    fn record(price: &str) -> ListingRecord {
        ListingRecord::new(
            ListingSummary {
                category: "Condo".to_string(),
                features: "1 Beds, 1 baths".to_string(),
                price: Some(price.to_string()),
                city: None,
                detail_url: Some("https://www.centris.ca/en/1".to_string()),
            },
            Some("1 Rue A".to_string()),
            Some("Cozy".to_string()),
        )
    }

    #[tokio::test]
    async fn test_writes_one_object_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("listings.jsonl");

        let mut sink = JsonLinesSink::create(&path).await.unwrap();
        sink.write(&record("100")).await.unwrap();
        sink.write(&record("200")).await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(sink.written(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["price"], "200");
        assert_eq!(second["url"], "https://www.centris.ca/en/1");
        assert!(second["city"].is_null());
    }
}
