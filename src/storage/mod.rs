//! Artifact persistence
//!
//! - [`ArtifactStore`]: one artifact file, replaced atomically on save and
//!   checksum-verified on load
//! - [`ArtifactSlot`]: the in-memory current artifact, swapped wholesale and
//!   retrained at most once at a time

use crate::error::{PredictorError, Result};
use crate::ml::{FittedModel, PredictionService, RandomForest, Regressor, TrainedArtifact, TrainingPipeline};
use crate::schema::{FeatureSchema, LabeledRecord};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// On-disk layout: the artifact plus a digest of its serialized form
#[derive(Serialize, Deserialize)]
struct ArtifactEnvelope<A> {
    checksum: String,
    artifact: A,
}

fn checksum<M: Serialize>(artifact: &TrainedArtifact<M>) -> Result<String> {
    let bytes = serde_json::to_vec(artifact)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// A single artifact file
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "artifact".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write the artifact to a staging file, then rename it over the target
    pub fn save<M: FittedModel + Serialize>(&self, artifact: &TrainedArtifact<M>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let envelope = ArtifactEnvelope {
            checksum: checksum(artifact)?,
            artifact,
        };

        let staging = self.staging_path();
        if let Err(e) = Self::write_staged(&staging, &envelope, &self.path) {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {}: {}", staging.display(), cleanup);
                }
            }
            return Err(e);
        }

        tracing::info!("Saved artifact {} to {}", artifact.id(), self.path.display());
        Ok(())
    }

    fn write_staged<T: Serialize>(staging: &Path, value: &T, target: &Path) -> Result<()> {
        let file = File::create(staging)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        std::fs::rename(staging, target)?;
        Ok(())
    }

    /// Load and verify the artifact. A missing file is `ArtifactNotLoaded`.
    pub fn load<M: FittedModel + Serialize + DeserializeOwned>(&self) -> Result<TrainedArtifact<M>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("No artifact at {}", self.path.display());
                return Err(PredictorError::ArtifactNotLoaded);
            }
            Err(e) => return Err(e.into()),
        };

        let envelope: ArtifactEnvelope<TrainedArtifact<M>> = serde_json::from_slice(&bytes)
            .map_err(|e| PredictorError::CorruptArtifact(format!("{}: {}", self.path.display(), e)))?;

        let actual = checksum(&envelope.artifact)?;
        if actual != envelope.checksum {
            return Err(PredictorError::CorruptArtifact(format!(
                "{}: checksum mismatch",
                self.path.display()
            )));
        }
        envelope.artifact.validate()?;

        tracing::info!(
            "Loaded artifact {} ({} trained {}) from {}",
            envelope.artifact.id(),
            envelope.artifact.metadata().estimator,
            envelope.artifact.metadata().trained_at,
            self.path.display()
        );
        Ok(envelope.artifact)
    }
}

/// Holder of the current artifact.
///
/// Readers take an `Arc` snapshot and never block each other; replacement
/// swaps the whole artifact. Training runs through one slot are serialized.
pub struct ArtifactSlot<M = RandomForest> {
    current: RwLock<Option<Arc<TrainedArtifact<M>>>>,
    training: Mutex<()>,
}

impl<M: FittedModel> Default for ArtifactSlot<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: FittedModel> ArtifactSlot<M> {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            training: Mutex::new(()),
        }
    }

    /// Snapshot of the current artifact
    pub fn current(&self) -> Option<Arc<TrainedArtifact<M>>> {
        self.current.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the current artifact
    pub fn install(&self, artifact: TrainedArtifact<M>) -> Arc<TrainedArtifact<M>> {
        let artifact = Arc::new(artifact);
        *self.current.write() = Some(artifact.clone());
        artifact
    }

    /// Drop the current artifact
    pub fn clear(&self) -> Option<Arc<TrainedArtifact<M>>> {
        self.current.write().take()
    }

    /// Prediction service bound to the current artifact, or unloaded if none
    pub fn service(&self, schema: FeatureSchema) -> PredictionService<M> {
        match self.current() {
            Some(artifact) => PredictionService::with_artifact(schema, artifact),
            None => PredictionService::new(schema),
        }
    }

    /// Load from a store and install. The slot is untouched on failure.
    pub fn reload(&self, store: &ArtifactStore) -> Result<Arc<TrainedArtifact<M>>>
    where
        M: Serialize + DeserializeOwned,
    {
        let artifact = store.load()?;
        Ok(self.install(artifact))
    }

    /// Train, optionally persist, then install.
    ///
    /// Concurrent calls on the same slot run one after another. If training
    /// or saving fails, the previous artifact stays in place.
    pub fn retrain<R>(
        &self,
        pipeline: &TrainingPipeline<R>,
        data: &[LabeledRecord],
        store: Option<&ArtifactStore>,
    ) -> Result<Arc<TrainedArtifact<M>>>
    where
        R: Regressor<Model = M>,
        M: Serialize,
    {
        let _guard = self.training.lock();
        let artifact = pipeline.train(data)?;
        if let Some(store) = store {
            store.save(&artifact)?;
        }
        Ok(self.install(artifact))
    }
}
