//! Device folder types.
//!
//! These types are serialized to JSON for the folder list in the UI.

use serde::{Deserialize, Serialize};

/// A well-known folder location on a device, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPattern {
    /// For example, "DCIM/Camera".
    pub relative_path: String,
    /// For example, "Camera".
    pub display_name: String,
}

impl PathPattern {
    pub fn new(relative_path: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            display_name: display_name.into(),
        }
    }
}

/// A folder found on the device by the last scan. Only folders with at least one media file
/// are ever created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredFolder {
    pub relative_path: String,
    pub display_name: String,
    /// Lower bound: the scanner stops counting at its probe limit.
    pub media_count: usize,
}

impl DiscoveredFolder {
    /// Label for the folder list, like "Camera (50+)" when the count hit the probe limit.
    pub fn label(&self, probe_limit: usize) -> String {
        if self.media_count >= probe_limit {
            format!("{} ({}+)", self.display_name, self.media_count)
        } else {
            format!("{} ({})", self.display_name, self.media_count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_exact_count() {
        let folder = DiscoveredFolder {
            relative_path: "DCIM/Camera".to_string(),
            display_name: "Camera".to_string(),
            media_count: 7,
        };
        assert_eq!(folder.label(50), "Camera (7)");
    }

    #[test]
    fn test_label_at_probe_limit_is_lower_bound() {
        let folder = DiscoveredFolder {
            relative_path: "DCIM/Camera".to_string(),
            display_name: "Camera".to_string(),
            media_count: 50,
        };
        assert_eq!(folder.label(50), "Camera (50+)");
    }

    #[test]
    fn test_folder_serialization() {
        let folder = DiscoveredFolder {
            relative_path: "Pictures/Screenshots".to_string(),
            display_name: "Screenshots".to_string(),
            media_count: 3,
        };
        let json = serde_json::to_string(&folder).unwrap();
        assert!(json.contains("\"relativePath\":\"Pictures/Screenshots\""));
        assert!(json.contains("\"mediaCount\":3"));
    }
}
