pub mod synthetic;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One image/segmentation pair on disk. The fold partitioner never looks
/// inside a sample, it only needs a list of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub image: PathBuf,
    pub label: PathBuf,
}

impl Sample {
    pub fn new(image: impl Into<PathBuf>, label: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            label: label.into(),
        }
    }

    /// `img{i}.nii.gz` / `seg{i}.nii.gz` under `dir`.
    pub fn numbered(dir: impl AsRef<Path>, i: usize) -> Self {
        let dir = dir.as_ref();
        Self {
            image: dir.join(format!("img{i}.nii.gz")),
            label: dir.join(format!("seg{i}.nii.gz")),
        }
    }
}
