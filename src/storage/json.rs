use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs::File as TokioFile;
use tokio::io::{AsyncWriteExt, BufWriter as TokioBufWriter};
use tracing::info;

use crate::error::Result;
use crate::models::ReviewRow;

/// Streaming JSON-array writer for the run's output artifact. Rows are
/// flushed as they arrive so a crashed run still leaves readable output up
/// to its last complete element.
pub struct JsonWriter {
    writer: TokioBufWriter<TokioFile>,
    path: PathBuf,
    count: AtomicUsize,
    is_first: bool,
}

impl JsonWriter {
    pub async fn create(directory: &str, file_name: &str) -> Result<Self> {
        tokio::fs::create_dir_all(directory).await?;

        let path = Path::new(directory).join(file_name);
        let file = TokioFile::create(&path).await?;
        let mut writer = TokioBufWriter::new(file);
        writer.write_all(b"[\n").await?;

        Ok(Self {
            writer,
            path,
            count: AtomicUsize::new(0),
            is_first: true,
        })
    }

    pub async fn write_row(&mut self, row: &ReviewRow) -> Result<()> {
        if !self.is_first {
            self.writer.write_all(b",\n").await?;
        }
        self.is_first = false;

        let json = serde_json::to_vec(row)?;
        self.writer.write_all(&json).await?;
        self.count.fetch_add(1, Ordering::SeqCst);
        self.writer.flush().await?;

        Ok(())
    }

    pub async fn finish(&mut self) -> Result<()> {
        self.writer.write_all(b"\n]").await?;
        self.writer.flush().await?;
        info!(
            rows = self.get_count(),
            path = %self.path.display(),
            "Output artifact written"
        );
        Ok(())
    }

    pub fn get_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
