use std::path::{Path, PathBuf};

use crate::error::{BrowseError, Result};

pub const NOTE_EXTENSION: &str = "md";

pub const PREVIEW_MAX_LINES: usize = 10;
pub const PREVIEW_MAX_CHARS: usize = 1200;

// ---------------------------------------------------------------------------
// NoteStore – small text files in one directory
// ---------------------------------------------------------------------------

/// A directory of notes addressed by file name. Writes overwrite; the last
/// write wins.
#[derive(Debug, Clone)]
pub struct NoteStore {
    dir: PathBuf,
}

impl NoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        NoteStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names with the given extension, sorted. A missing directory
    /// holds no notes.
    pub fn list(&self, extension: &str) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let matches = path.is_file()
                && path
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension));
            if let (true, Some(name)) = (matches, path.file_name().and_then(|n| n.to_str())) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Content of a note; empty when the file does not exist.
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.path_of(name)?;
        if !path.exists() {
            return Ok(String::new());
        }
        Ok(std::fs::read_to_string(path)?)
    }

    pub fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.path_of(name)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, content)?;
        log::info!("Saved note {}", path.display());
        Ok(())
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(BrowseError::InvalidNoteName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

/// Names containing `needle`, ignoring case. An empty needle keeps all.
pub fn filter_names(names: &[String], needle: &str) -> Vec<String> {
    let needle = needle.to_lowercase();
    names
        .iter()
        .filter(|n| n.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// NotePreview – what the side panel shows of a note
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotePreview {
    /// Short enough to show whole.
    Full(String),
    /// A shortened rendering; the full text is one click away.
    Truncated(String),
}

impl NotePreview {
    /// Notes of at most [`PREVIEW_MAX_LINES`] lines and [`PREVIEW_MAX_CHARS`]
    /// characters are shown whole, others cut down.
    pub fn of(content: &str) -> Self {
        let lines: Vec<&str> = content.lines().collect();
        let chars = content.chars().count();
        if lines.len() <= PREVIEW_MAX_LINES && chars <= PREVIEW_MAX_CHARS {
            return NotePreview::Full(content.to_string());
        }

        let mut preview = lines[..lines.len().min(PREVIEW_MAX_LINES)].join("\n");
        if preview.chars().count() > PREVIEW_MAX_CHARS {
            preview = preview.chars().take(PREVIEW_MAX_CHARS).collect();
            preview.push_str("\n\n... (preview truncated by characters)");
        } else if lines.len() > PREVIEW_MAX_LINES {
            preview.push_str(&format!(
                "\n\n... (file truncated: showing {PREVIEW_MAX_LINES} of {} lines)",
                lines.len()
            ));
        }
        NotePreview::Truncated(preview)
    }

    pub fn text(&self) -> &str {
        match self {
            NotePreview::Full(t) | NotePreview::Truncated(t) => t,
        }
    }
}
