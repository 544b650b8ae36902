//! Known device folder locations and their display names.

use super::types::PathPattern;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Built-in locations, in the order they're shown. Camera and screenshots come before app
/// folders so the folders people look for first are at the top of the list.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("DCIM/Camera", "Camera"),
    ("DCIM/100ANDRO", "Camera"),
    ("DCIM/100APPLE", "Camera"),
    ("DCIM/Screenshots", "Screenshots"),
    ("Pictures/Screenshots", "Screenshots"),
    ("DCIM/Screen recordings", "Screen recordings"),
    ("Movies/Screen recordings", "Screen recordings"),
    ("Pictures", "Pictures"),
    ("Movies", "Videos"),
    ("Download", "Downloads"),
    ("Pictures/Instagram", "Instagram"),
    ("Android/media/com.whatsapp/WhatsApp/Media/WhatsApp Images", "WhatsApp Images"),
    ("Android/media/com.whatsapp/WhatsApp/Media/WhatsApp Video", "WhatsApp Video"),
    ("WhatsApp/Media/WhatsApp Images", "WhatsApp Images"),
    ("WhatsApp/Media/WhatsApp Video", "WhatsApp Video"),
    ("Pictures/Telegram", "Telegram"),
    ("Telegram/Telegram Images", "Telegram"),
    ("Pictures/Messenger", "Messenger"),
    ("Pictures/Signal", "Signal"),
    ("Snapchat", "Snapchat"),
];

static BUILTIN: LazyLock<PathPatternCatalog> = LazyLock::new(|| PathPatternCatalog {
    patterns: BUILTIN_PATTERNS
        .iter()
        .map(|(path, name)| PathPattern::new(*path, *name))
        .collect(),
});

/// Error building a custom catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Two patterns share a relative path.
    DuplicatePath { relative_path: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePath { relative_path } => {
                write!(f, "Duplicate folder pattern: {}", relative_path)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// An immutable, ordered list of known device folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPatternCatalog {
    patterns: Vec<PathPattern>,
}

impl PathPatternCatalog {
    /// The built-in catalog, shared by the whole process.
    pub fn builtin() -> &'static PathPatternCatalog {
        &BUILTIN
    }

    /// Builds a catalog from custom patterns. Relative paths must be unique.
    pub fn with_patterns(patterns: Vec<PathPattern>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for pattern in &patterns {
            if !seen.insert(normalize_key(&pattern.relative_path)) {
                return Err(CatalogError::DuplicatePath {
                    relative_path: pattern.relative_path.clone(),
                });
            }
        }
        Ok(Self { patterns })
    }

    /// Returns a copy of this catalog with `extra` appended after the existing patterns.
    pub fn extended(&self, extra: &[PathPattern]) -> Result<Self, CatalogError> {
        let mut patterns = self.patterns.clone();
        patterns.extend_from_slice(extra);
        Self::with_patterns(patterns)
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    /// The label for a device folder. Unknown paths get their last segment, humanized.
    pub fn display_name_for(&self, relative_path: &str) -> String {
        let key = normalize_key(relative_path);
        self.patterns
            .iter()
            .find(|p| normalize_key(&p.relative_path) == key)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| humanize_segment(&key))
    }
}

/// "/DCIM/Camera/" and "DCIM/Camera" are the same folder.
fn normalize_key(relative_path: &str) -> String {
    relative_path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// "my_trip-2024" becomes "My trip 2024".
fn humanize_segment(relative_path: &str) -> String {
    let last = relative_path.rsplit('/').next().unwrap_or_default();
    let spaced = last.replace(['_', '-'], " ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    if words.is_empty() {
        return "Storage".to_string();
    }
    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => joined,
    }
}
