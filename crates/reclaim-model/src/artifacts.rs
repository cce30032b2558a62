//! Artifact loading and the model bundle
//!
//! The bundle is built once at startup from a fixed directory holding four
//! files:
//!
//! ```text
//! models/
//!   preprocessor.json
//!   Resale_Value_GradientBoosting_Model.json
//!   Recycle_Value_GradientBoosting_Model.json
//!   Reuse_Score_GradientBoosting_Model.json
//! ```
//!
//! Loading is all-or-nothing. A missing or broken file leaves the bundle
//! unloaded and the service scores with the heuristic fallback instead.

use crate::error::ArtifactError;
use crate::preprocess::Preprocessor;
use crate::regressor::GradientBoostingRegressor;
use crate::target::Target;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory searched when none is configured.
pub const DEFAULT_MODELS_DIR: &str = "models";

pub const PREPROCESSOR_FILE: &str = "preprocessor.json";

/// The preprocessor plus one regressor per target.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadedArtifacts {
    pub(crate) preprocessor: Preprocessor,
    pub(crate) models: BTreeMap<Target, GradientBoostingRegressor>,
}

/// Process-wide prediction state. Either every artifact is present or none is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBundle {
    artifacts: Option<LoadedArtifacts>,
}

impl ModelBundle {
    /// A bundle with nothing loaded. Predictions use the fallback.
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Assemble a loaded bundle from in-memory artifacts. Every artifact is
    /// validated as if it had been read from disk.
    pub fn from_parts(
        preprocessor: Preprocessor,
        models: BTreeMap<Target, GradientBoostingRegressor>,
    ) -> Result<Self, ArtifactError> {
        Self::assemble(Path::new(""), preprocessor, models)
    }

    fn assemble(
        dir: &Path,
        preprocessor: Preprocessor,
        models: BTreeMap<Target, GradientBoostingRegressor>,
    ) -> Result<Self, ArtifactError> {
        if let Some(target) = Target::ALL.into_iter().find(|t| !models.contains_key(t)) {
            return Err(ArtifactError::MissingTarget(target));
        }
        preprocessor
            .validate()
            .map_err(|reason| ArtifactError::Invalid {
                path: dir.join(PREPROCESSOR_FILE),
                reason,
            })?;
        for (target, model) in &models {
            model.validate().map_err(|reason| ArtifactError::Invalid {
                path: dir.join(target.artifact_file()),
                reason,
            })?;
        }
        Ok(Self {
            artifacts: Some(LoadedArtifacts {
                preprocessor,
                models,
            }),
        })
    }

    /// Load from `dir`, logging instead of failing. The returned bundle is
    /// unloaded if any artifact is missing or invalid.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        match Self::try_load(dir) {
            Ok(bundle) => {
                info!(dir = %dir.display(), "Models loaded");
                bundle
            }
            Err(e) => {
                warn!(
                    dir = %dir.display(),
                    error = %e,
                    "Models NOT loaded, using fallback scoring"
                );
                Self::unloaded()
            }
        }
    }

    /// Load from `dir`, returning the first failure.
    ///
    /// Every file is checked for existence before any is decoded.
    pub fn try_load(dir: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref();
        for (_, path) in artifact_paths(dir) {
            if !path.is_file() {
                return Err(ArtifactError::Missing(path));
            }
        }

        let preprocessor: Preprocessor = read_artifact(&dir.join(PREPROCESSOR_FILE))?;
        let mut models = BTreeMap::new();
        for target in Target::ALL {
            let model: GradientBoostingRegressor =
                read_artifact(&dir.join(target.artifact_file()))?;
            models.insert(target, model);
        }

        Self::assemble(dir, preprocessor, models)
    }

    /// True iff the preprocessor and all three models are present.
    pub fn is_loaded(&self) -> bool {
        self.artifacts.is_some()
    }

    pub fn preprocessor(&self) -> Option<&Preprocessor> {
        self.artifacts.as_ref().map(|a| &a.preprocessor)
    }

    pub fn model(&self, target: Target) -> Option<&GradientBoostingRegressor> {
        self.artifacts.as_ref().and_then(|a| a.models.get(&target))
    }

    pub(crate) fn artifacts(&self) -> Option<&LoadedArtifacts> {
        self.artifacts.as_ref()
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Expected artifact files under `dir`, labelled for diagnostics.
pub fn artifact_paths(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut paths = vec![("preprocessor".to_string(), dir.join(PREPROCESSOR_FILE))];
    paths.extend(
        Target::ALL
            .into_iter()
            .map(|t| (t.name().to_string(), dir.join(t.artifact_file()))),
    );
    paths
}

/// Existence of one expected artifact file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub label: String,
    pub path: PathBuf,
    pub exists: bool,
}

/// Report which expected artifacts exist under `dir`.
pub fn artifact_inventory(dir: impl AsRef<Path>) -> Vec<ArtifactStatus> {
    artifact_paths(dir.as_ref())
        .into_iter()
        .map(|(label, path)| ArtifactStatus {
            exists: path.is_file(),
            label,
            path,
        })
        .collect()
}
