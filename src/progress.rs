use crate::position::Position;
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

/// Reading progress for one book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub chapter: usize,
    pub paragraph: usize,
    pub sentence: usize,
    #[serde(default)]
    pub scroll_offset: f32,
    #[serde(default = "default_true")]
    pub tts_enabled: bool,
    #[serde(default = "default_true")]
    pub auto_scroll: bool,
    /// Topmost visible sentence when the reader was in manual-scroll mode;
    /// restored as the scroll position on load.
    #[serde(default)]
    pub manual_anchor: Option<Position>,
    pub last_read: chrono::DateTime<chrono::Utc>,
}

impl ProgressRecord {
    pub fn position(&self) -> Position {
        Position::new(self.chapter, self.paragraph, self.sentence)
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            chapter: 0,
            paragraph: 0,
            sentence: 0,
            scroll_offset: 0.0,
            tts_enabled: true,
            auto_scroll: true,
            manual_anchor: None,
            last_read: chrono::Utc::now(),
        }
    }
}

/// Progress records keyed by book id, persisted as one JSON file. A load
/// failure degrades to an empty store; saving never blocks navigation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressStore {
    books: HashMap<String, ProgressRecord>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl ProgressStore {
    pub fn ephemeral() -> Self {
        Self {
            books: HashMap::new(),
            file_path: None,
        }
    }

    pub fn with_file(file_path: &Path) -> Self {
        Self {
            books: HashMap::new(),
            file_path: Some(file_path.to_path_buf()),
        }
    }

    pub fn load_or_ephemeral(file_path: Option<&Path>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                error!("failed to load progress from {}: {}", path.display(), e);
                Self::with_file(path)
            }),
            None => Self::ephemeral(),
        }
    }

    pub fn load_from_file(file_path: &Path) -> anyhow::Result<Self> {
        if file_path.exists() {
            let content = fs::read_to_string(file_path)?;
            let mut store: Self = serde_json::from_str(&content)?;
            store.file_path = Some(file_path.to_path_buf());
            Ok(store)
        } else {
            Ok(Self::with_file(file_path))
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, book_id: &str) -> Option<&ProgressRecord> {
        self.books.get(book_id)
    }

    /// Inserts the record and writes the store through. A save failure is
    /// logged; the in-memory record stays current either way.
    pub fn update(&mut self, book_id: &str, record: ProgressRecord) {
        self.books.insert(book_id.to_string(), record);
        if self.file_path.is_some() {
            if let Err(e) = self.save() {
                error!("failed to save progress: {}", e);
            }
        }
    }
}

/// Default store location under the platform data dir.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("lectern").join("progress.json"))
}
