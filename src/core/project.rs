//! Project document: the single JSON file that persists a session.
//!
//! The document carries the source media path, the analysis configuration,
//! the cut list, and any transcript segments. The core guarantees round-trip
//! fidelity and nothing more; interpretation of transcripts belongs to the
//! hosts that produce them.

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

use crate::core::model::{AnalysisConfig, Cut};
use crate::Result;

/// Word-level transcript datum, carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub text: String,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
    /// Recognition confidence, 0.0..=1.0.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

/// Sentence/paragraph-level transcript datum, carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: String,
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub words: Vec<TranscriptWord>,
}

/// The persisted project state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub modified_at: String,

    /// Path of the source media file.
    pub media_path: PathBuf,

    /// Detector knobs used for the stored cut list.
    pub config: AnalysisConfig,
    /// All cuts, enabled or not, in storage order.
    pub cuts: Vec<Cut>,

    #[serde(default)]
    pub transcript_segments: Vec<TranscriptSegment>,
    #[serde(default = "default_language")]
    pub transcript_language: String,
}

fn default_language() -> String {
    "auto".to_string()
}

impl Project {
    /// Create a fresh project for the given media path.
    pub fn new(media_path: PathBuf) -> Self {
        let now = Utc::now().to_rfc3339();
        let name = media_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled Project".to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            created_at: now.clone(),
            modified_at: now,
            media_path,
            config: AnalysisConfig::default(),
            cuts: Vec::new(),
            transcript_segments: Vec::new(),
            transcript_language: default_language(),
        }
    }

    /// Persist the project as pretty-printed JSON.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.modified_at = Utc::now().to_rfc3339();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Project saved to {}", path.display());
        Ok(())
    }

    /// Load a project from a JSON document.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let project: Project = serde_json::from_str(&content)?;
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::CutType;
    use tempfile::TempDir;

    #[test]
    fn test_new_project_names_after_stem() {
        let project = Project::new(PathBuf::from("/media/podcast_ep12.mp4"));
        assert_eq!(project.name, "podcast_ep12");
        assert_eq!(project.transcript_language, "auto");
        assert!(project.cuts.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.autocut");

        let mut project = Project::new(PathBuf::from("/media/talk.mov"));
        project.cuts.push(Cut::new(1.0, 2.5, CutType::Silence));
        project.config.silence_threshold_db = -42.0;
        project.transcript_segments.push(TranscriptSegment {
            id: "seg1".to_string(),
            text: "hello world".to_string(),
            start: 0.0,
            end: 1.0,
            language: "en".to_string(),
            words: vec![TranscriptWord {
                text: "hello".to_string(),
                start: 0.0,
                end: 0.4,
                confidence: 0.97,
            }],
        });
        project.save(&path).unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.cuts, project.cuts);
        assert_eq!(loaded.config, project.config);
        assert_eq!(loaded.transcript_segments, project.transcript_segments);
        assert_eq!(loaded.media_path, PathBuf::from("/media/talk.mov"));
    }

    #[test]
    fn test_load_tolerates_missing_optional_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("minimal.autocut");
        std::fs::write(
            &path,
            r#"{
                "id": "x",
                "name": "minimal",
                "created_at": "2026-01-01T00:00:00Z",
                "modified_at": "2026-01-01T00:00:00Z",
                "media_path": "/media/a.mp4",
                "config": {},
                "cuts": []
            }"#,
        )
        .unwrap();

        let loaded = Project::load(&path).unwrap();
        assert!(loaded.transcript_segments.is_empty());
        assert_eq!(loaded.transcript_language, "auto");
        assert_eq!(loaded.config, AnalysisConfig::default());
    }
}
