//! Generate/download workflow state machine
//!
//! The controller owns the session and decides which actions are enabled and
//! what the status line shows. It performs no I/O: callers run the request
//! returned by [`GenerationController::begin`] and hand the outcome back to
//! [`GenerationController::finish`].

use std::fmt;

use crate::config::ServiceConfig;
use crate::error::{ControllerError, GenerateError};
use crate::protocol::GenerateResponse;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPhase {
    #[default]
    Idle,
    Generating,
    /// A request completed (either way); behaves like `Idle` for re-entry
    Result,
}

/// Text shown in the status line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Ready,
    Generating,
    Generated { key_id: String },
    GenerationFailed,
    ModelLoadFailed,
}

impl Status {
    /// Whether the status line should show a busy indicator
    pub fn is_busy(&self) -> bool {
        matches!(self, Status::Generating)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => write!(f, "System Ready"),
            Status::Generating => write!(f, "Generating..."),
            Status::Generated { key_id } => write!(f, "Generated Key ID: {}", key_id),
            Status::GenerationFailed => write!(f, "Generation Failed"),
            Status::ModelLoadFailed => write!(f, "Error loading 3D model."),
        }
    }
}

/// A model load requested by a successful generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub key_id: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct GenerationController {
    config: ServiceConfig,
    session: Session,
    phase: GenerationPhase,
    status: Status,
}

impl GenerationController {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            session: Session::new(),
            phase: GenerationPhase::Idle,
            status: Status::Ready,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Generate is enabled whenever no request is outstanding
    pub fn can_generate(&self) -> bool {
        self.phase != GenerationPhase::Generating
    }

    /// Download is enabled once a generation has succeeded, except while a
    /// new request is outstanding
    pub fn can_download(&self) -> bool {
        self.phase != GenerationPhase::Generating && self.session.has_key()
    }

    /// Enter `Generating` and return the URL to POST to
    pub fn begin(&mut self) -> Result<String, ControllerError> {
        if self.phase == GenerationPhase::Generating {
            return Err(ControllerError::AlreadyGenerating);
        }

        self.phase = GenerationPhase::Generating;
        self.status = Status::Generating;
        tracing::debug!("Generation started");
        Ok(self.config.generate_url())
    }

    /// Complete the outstanding request; returns the model to load on success
    pub fn finish(
        &mut self,
        outcome: Result<GenerateResponse, GenerateError>,
    ) -> Option<ModelRequest> {
        if self.phase != GenerationPhase::Generating {
            tracing::warn!("Ignoring generation result with no request outstanding");
            return None;
        }

        // Generate is re-enabled on every path
        self.phase = GenerationPhase::Result;

        match outcome {
            Ok(response) => {
                tracing::info!("Generated key {}", response.key_id);
                self.session.set_key_id(response.key_id.clone());
                self.status = Status::Generated {
                    key_id: response.key_id.clone(),
                };
                Some(ModelRequest {
                    url: self.config.resolve(&response.stl_url),
                    key_id: response.key_id,
                })
            }
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                self.status = Status::GenerationFailed;
                None
            }
        }
    }

    /// Report that the latest model load failed
    pub fn model_failed(&mut self) {
        self.status = Status::ModelLoadFailed;
    }

    /// Where the download action should navigate, if anywhere
    pub fn download_target(&self) -> Option<String> {
        self.session
            .key_id()
            .map(|key_id| self.config.download_url(key_id))
    }
}
