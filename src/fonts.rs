//! # Font Discovery
//!
//! Finds TrueType/OpenType files installed on the host so labels can be set
//! in a font chosen by name.
//!
//! | Directory | Notes |
//! |-----------|-------|
//! | `/usr/share/fonts` | distribution packages |
//! | `/usr/local/share/fonts` | locally installed |
//! | `~/.fonts`, `~/.local/share/fonts` | per user |
//!
//! Fonts are named after their file stem (`DejaVuSans-Bold.ttf` is
//! `DejaVuSans-Bold`). Lookup ignores case, spaces and punctuation: an exact
//! name wins, otherwise the shortest name containing the query.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// One usable font file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Fonts found on the host, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    fonts: Vec<FontEntry>,
}

impl FontCatalog {
    /// The system and per-user font directories.
    pub fn default_dirs() -> Vec<PathBuf> {
        let mut dirs = vec![
            PathBuf::from("/usr/share/fonts"),
            PathBuf::from("/usr/local/share/fonts"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            dirs.push(home.join(".fonts"));
            dirs.push(home.join(".local/share/fonts"));
        }
        dirs
    }

    /// Scan the default directories.
    pub fn system() -> Self {
        Self::scan(&Self::default_dirs())
    }

    /// Walk `dirs` recursively. Missing or unreadable directories are skipped.
    pub fn scan(dirs: &[PathBuf]) -> Self {
        let mut fonts = Vec::new();
        for dir in dirs {
            collect(dir, &mut fonts);
        }
        fonts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        fonts.dedup_by(|a, b| a.name == b.name);

        info!(count = fonts.len(), "font catalog scanned");
        Self { fonts }
    }

    pub fn fonts(&self) -> &[FontEntry] {
        &self.fonts
    }

    /// Sorted, de-duplicated font names.
    pub fn families(&self) -> Vec<String> {
        self.fonts.iter().map(|f| f.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Look a font up by name.
    pub fn find(&self, query: &str) -> Option<&FontEntry> {
        let wanted = normalize(query);
        if wanted.is_empty() {
            return None;
        }

        self.fonts
            .iter()
            .find(|f| normalize(&f.name) == wanted)
            .or_else(|| {
                self.fonts
                    .iter()
                    .filter(|f| normalize(&f.name).contains(&wanted))
                    .min_by_key(|f| f.name.len())
            })
    }
}

fn collect(dir: &Path, fonts: &mut Vec<FontEntry>) {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, fonts);
            continue;
        }
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_font {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|s| s.to_str())
            && !name.is_empty()
        {
            fonts.push(FontEntry {
                name: name.to_string(),
                path,
            });
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
