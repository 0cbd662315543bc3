//! Analyst session: the loaded image's raw scene plus the last good
//! synthesis result.
//!
//! The scene is extracted once per image and cached here. Parameter
//! changes call [`Session::update`], which re-runs synthesis against the
//! cached scene. A failed update is reported to the caller and leaves
//! the previous trajectories and parameters in place.

use crate::synthesis::{RawScene, synthesize};
use crate::types::{SynthesisConfig, SynthesisError, Trajectory};

/// Cached scene and current synthesis result for one loaded image.
#[derive(Debug, Clone)]
pub struct Session {
    scene: RawScene,
    config: SynthesisConfig,
    trajectories: Vec<Trajectory>,
}

impl Session {
    /// Cache `scene` and run the first synthesis with `config`.
    ///
    /// # Errors
    ///
    /// Returns the [`SynthesisError`] of the first run; there is no
    /// previous result to fall back to.
    pub fn load(scene: RawScene, config: SynthesisConfig) -> Result<Self, SynthesisError> {
        let trajectories = synthesize(&scene, &config)?;
        Ok(Self {
            scene,
            config,
            trajectories,
        })
    }

    /// Re-synthesize the cached scene with new parameters.
    ///
    /// # Errors
    ///
    /// Returns the [`SynthesisError`] of the run. The session then still
    /// holds the previous parameters and trajectories.
    pub fn update(&mut self, config: SynthesisConfig) -> Result<&[Trajectory], SynthesisError> {
        let trajectories = synthesize(&self.scene, &config)?;
        self.config = config;
        self.trajectories = trajectories;
        Ok(&self.trajectories)
    }

    /// Replace the cached scene with a newly loaded image's scene and
    /// re-synthesize with the current parameters.
    ///
    /// # Errors
    ///
    /// Returns the [`SynthesisError`] of the run. The new scene is kept
    /// regardless, and the trajectories of the old image are cleared.
    pub fn reload(&mut self, scene: RawScene) -> Result<&[Trajectory], SynthesisError> {
        self.scene = scene;
        self.trajectories.clear();
        self.trajectories = synthesize(&self.scene, &self.config)?;
        Ok(&self.trajectories)
    }

    /// The cached raw scene.
    #[must_use]
    pub const fn scene(&self) -> &RawScene {
        &self.scene
    }

    /// Parameters of the last successful synthesis.
    #[must_use]
    pub const fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Trajectories of the last successful synthesis.
    #[must_use]
    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }
}
