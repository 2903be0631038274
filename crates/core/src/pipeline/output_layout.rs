use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::shared::constants::{
    FEATURE_FILE_EXTENSION, METRICS_FILE_NAME, PRED_CROPS_DIR, PRED_CROP_VIDEOS_DIR,
    TRUE_CROP_VIDEOS_DIR,
};

/// Problems that stop a run before (or after) any item is processed.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read validation set {path}: {source}")]
    ReadValidationSet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("validation set {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory tree of an evaluation run:
///
/// ```text
/// results/
///   metrics.json
///   pred_crops/<feature file name>
///   true_crop_videos/<video file name>   (visualize only)
///   pred_crop_videos/<video file name>   (visualize only)
/// ```
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
    visualize: bool,
}

impl OutputLayout {
    /// Creates every directory the run will write into.
    pub fn create(root: impl Into<PathBuf>, visualize: bool) -> Result<Self, SetupError> {
        let layout = Self {
            root: root.into(),
            visualize,
        };
        create_dir(&layout.pred_crops_dir())?;
        if visualize {
            create_dir(&layout.root.join(TRUE_CROP_VIDEOS_DIR))?;
            create_dir(&layout.root.join(PRED_CROP_VIDEOS_DIR))?;
        }
        Ok(layout)
    }

    pub fn visualize(&self) -> bool {
        self.visualize
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.root.join(METRICS_FILE_NAME)
    }

    pub fn pred_crops_dir(&self) -> PathBuf {
        self.root.join(PRED_CROPS_DIR)
    }

    pub fn pred_crops_path(&self, feature_file_name: &str) -> PathBuf {
        self.pred_crops_dir().join(feature_file_name)
    }

    pub fn true_crop_video_path(&self, video_file_name: &str) -> PathBuf {
        self.root.join(TRUE_CROP_VIDEOS_DIR).join(video_file_name)
    }

    pub fn pred_crop_video_path(&self, video_file_name: &str) -> PathBuf {
        self.root.join(PRED_CROP_VIDEOS_DIR).join(video_file_name)
    }
}

pub fn create_dir(path: &Path) -> Result<(), SetupError> {
    fs::create_dir_all(path).map_err(|e| SetupError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Feature files (`*.json`) directly inside `dir`, sorted by file name.
pub fn list_feature_files(dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    if !dir.is_dir() {
        return Err(SetupError::NotADirectory(dir.to_path_buf()));
    }
    let read_err = |e| SetupError::ReadValidationSet {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_feature_file = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == FEATURE_FILE_EXTENSION);
        if is_feature_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File name of `path` for logs and output names; falls back to the whole path.
pub fn item_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Serializes `value` as pretty JSON into `path`, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_without_visualize() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::create(dir.path().join("results"), false).unwrap();
        assert!(layout.pred_crops_dir().is_dir());
        assert!(!dir.path().join("results").join(TRUE_CROP_VIDEOS_DIR).exists());
        assert!(!dir.path().join("results").join(PRED_CROP_VIDEOS_DIR).exists());
    }

    #[test]
    fn test_create_with_visualize() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::create(dir.path(), true).unwrap();
        assert!(layout.visualize());
        assert!(dir.path().join(TRUE_CROP_VIDEOS_DIR).is_dir());
        assert!(dir.path().join(PRED_CROP_VIDEOS_DIR).is_dir());
        assert_eq!(
            layout.pred_crop_video_path("clip.mp4"),
            dir.path().join("pred_crop_videos").join("clip.mp4")
        );
        assert_eq!(layout.metrics_path(), dir.path().join("metrics.json"));
    }

    #[test]
    fn test_create_fails_under_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = OutputLayout::create(file.path().join("results"), false).unwrap_err();
        assert!(matches!(err, SetupError::CreateDir { .. }));
    }

    #[test]
    fn test_list_feature_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", "notes.txt", "c.JSON.bak"] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = list_feature_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_list_missing_dir_is_setup_error() {
        let err = list_feature_files(Path::new("/nonexistent/validation")).unwrap_err();
        assert!(matches!(err, SetupError::NotADirectory(_)));
    }

    #[test]
    fn test_item_name() {
        assert_eq!(item_name(Path::new("/data/val/clip_07.json")), "clip_07.json");
        assert_eq!(item_name(Path::new("/")), "/");
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crops.json");
        write_json(&path, &[656u32, 657][..]).unwrap();
        let read: Vec<u32> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(read, vec![656, 657]);
    }
}
