//! The stage-numbered checkpoint writer. Every pipeline stage dumps its
//! intermediate clouds under the run's output directory using a
//! deterministic ordered-stage-number prefix, e.g.
//! `01-AccumulatedPointCloud.bpc` or `03-ObjectCandidate-2.bpc`. These files
//! are the audit trail for offline inspection.
//!
//! Checkpoints are a write-only side channel: a failed write is logged and
//! never fails the run or a candidate. Per-candidate names carry the
//! candidate index, so concurrent workers never write the same file.

use crate::io::point_cloud::write_bpc;
use crate::{PointCloud, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CheckpointWriter {
    dir: PathBuf,
    enabled: bool,
}

impl CheckpointWriter {
    /// Create a writer rooted at `dir`. When enabled, the directory is
    /// created up front so a misconfigured output path fails the run before
    /// any stage does work.
    ///
    /// # Arguments
    ///
    /// * `dir`: the run's output directory
    /// * `enabled`: when false, every write becomes a no-op
    ///
    /// returns: Result<CheckpointWriter, ReconError>
    pub fn new(dir: &Path, enabled: bool) -> Result<Self> {
        if enabled {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            enabled,
        })
    }

    /// Write a cloud checkpoint as `<name>.bpc`, logging instead of failing
    /// on error.
    pub fn cloud(&self, name: &str, cloud: &PointCloud) {
        if !self.enabled {
            return;
        }
        let path = self.dir.join(format!("{}.bpc", name));
        if let Err(e) = write_bpc(&path, cloud) {
            log::warn!("failed to write checkpoint {}: {}", path.display(), e);
        }
    }

    /// Write a serializable value as `<name>.json`, logging instead of
    /// failing on error.
    pub fn json<T: Serialize>(&self, name: &str, value: &T) {
        if !self.enabled {
            return;
        }
        let path = self.dir.join(format!("{}.json", name));
        let result = serde_json::to_string_pretty(value)
            .map_err(|e| e.to_string())
            .and_then(|text| fs::write(&path, text).map_err(|e| e.to_string()));
        if let Err(e) = result {
            log::warn!("failed to write checkpoint {}: {}", path.display(), e);
        }
    }

    /// Write a mesh checkpoint as `<name>.stl`, logging instead of failing
    /// on error.
    #[cfg(feature = "stl")]
    pub fn mesh(&self, name: &str, mesh: &crate::Mesh) {
        if !self.enabled {
            return;
        }
        let path = self.dir.join(format!("{}.stl", name));
        if let Err(e) = crate::io::stl::write_stl(&path, mesh) {
            log::warn!("failed to write checkpoint {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point3;
    use crate::PointCloudFeatures;
    use crate::io::point_cloud::load_bpc;

    #[test]
    fn writes_named_cloud_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CheckpointWriter::new(dir.path(), true).unwrap();

        let cloud = PointCloud::from(
            [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0)].as_slice(),
        );
        writer.cloud("01-AccumulatedPointCloud", &cloud);

        let loaded = load_bpc(&dir.path().join("01-AccumulatedPointCloud.bpc")).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn disabled_writer_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CheckpointWriter::new(dir.path(), false).unwrap();

        let cloud = PointCloud::from([Point3::new(0.0, 0.0, 0.0)].as_slice());
        writer.cloud("01-AccumulatedPointCloud", &cloud);

        assert!(!dir.path().join("01-AccumulatedPointCloud.bpc").exists());
    }
}
