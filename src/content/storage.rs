//! Persistence of generated content.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Names tried per timestamp before giving up.
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no free file name for {0}")]
    NameExhausted(String),
}

/// Durable sink for generated text. Returns where the text was stored.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn save(&self, text: &str, content_type: &str) -> Result<String, StorageError>;
}

/// Writes each text to `{dir}/{content_type}_{YYYYmmdd_HHMMSS}.txt`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Restrict a client-supplied tag to characters safe in a file name.
pub fn sanitize_file_stem(tag: &str) -> String {
    let stem: String = tag
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    if stem.is_empty() {
        "content".to_string()
    } else {
        stem
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn save(&self, text: &str, content_type: &str) -> Result<String, StorageError> {
        fs::create_dir_all(&self.dir).await?;

        let base = format!(
            "{}_{}",
            sanitize_file_stem(content_type),
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}.txt", base)
            } else {
                format!("{}_{}.txt", base, attempt)
            };
            let path = self.dir.join(name);

            let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            file.write_all(text.as_bytes()).await?;
            file.flush().await?;
            return Ok(path.display().to_string());
        }

        Err(StorageError::NameExhausted(base))
    }
}
