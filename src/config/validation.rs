//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (workers, capacities, attempts > 0)
//! - Check the backend address is an http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RunConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::RunConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend address '{0}' is not an http(s) URL")]
    BackendAddress(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("ad-hoc query and name must both be non-empty")]
    EmptyAdhoc,
}

/// Check a configuration, collecting every violation.
pub fn validate_config(config: &RunConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.backend.address) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::BackendAddress(
            config.backend.address.clone(),
        )),
    }

    let positive: [(&'static str, u64); 7] = [
        ("pipeline.workers", config.pipeline.workers as u64),
        ("pipeline.queue_capacity", config.pipeline.queue_capacity as u64),
        ("pipeline.default_step_secs", config.pipeline.default_step_secs),
        ("retries.max_attempts", config.retries.max_attempts as u64),
        ("sources.fetch_attempts", config.sources.fetch_attempts as u64),
        ("render.width", config.render.width as u64),
        ("render.height", config.render.height as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if let Some(adhoc) = &config.adhoc {
        if adhoc.query.trim().is_empty() || adhoc.name.trim().is_empty() {
            errors.push(ValidationError::EmptyAdhoc);
        }
        if adhoc.step_secs == 0 {
            errors.push(ValidationError::Zero {
                field: "adhoc.step_secs",
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
