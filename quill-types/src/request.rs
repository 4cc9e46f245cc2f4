//! Request body and generation parameters.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum output length sent with every request.
pub const DEFAULT_MAX_LENGTH: u32 = 200;

/// Default sampling temperature sent with every request.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Range of `max_length` values the generation service accepts.
const MAX_LENGTH_RANGE: RangeInclusive<u32> = 20..=1000;

/// Range of `temperature` values the generation service accepts.
const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.1..=1.5;

/// Generation parameters that ride along with every prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    max_length: u32,
    temperature: f64,
}

/// Generation parameters outside the range the service accepts.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidParams {
    /// `max_length` outside `20..=1000`.
    #[error("max_length {0} out of range 20..=1000")]
    MaxLength(u32),

    /// `temperature` outside `0.1..=1.5` (or not a number).
    #[error("temperature {0} out of range 0.1..=1.5")]
    Temperature(f64),
}

impl GenerationParams {
    /// Build parameters, rejecting values the service would refuse.
    pub fn new(max_length: u32, temperature: f64) -> Result<Self, InvalidParams> {
        if !MAX_LENGTH_RANGE.contains(&max_length) {
            return Err(InvalidParams::MaxLength(max_length));
        }
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(InvalidParams::Temperature(temperature));
        }
        Ok(Self {
            max_length,
            temperature,
        })
    }

    /// Maximum output length.
    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    /// Sampling temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// JSON body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The user's prompt, already trimmed.
    pub prompt: String,
    /// Maximum output length.
    pub max_length: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl GenerateRequest {
    /// Build a request for `prompt` with the given parameters.
    ///
    /// The prompt is trimmed; callers that hold a raw draft can pass it as is.
    pub fn new(prompt: &str, params: GenerationParams) -> Self {
        Self {
            prompt: prompt.trim().to_string(),
            max_length: params.max_length,
            temperature: params.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        let params = GenerationParams::default();
        assert_eq!(params.max_length(), 200);
        assert_eq!(params.temperature(), 0.7);
    }

    #[test]
    fn new_accepts_bounds() {
        assert!(GenerationParams::new(20, 0.1).is_ok());
        assert!(GenerationParams::new(1000, 1.5).is_ok());
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert_eq!(
            GenerationParams::new(19, 0.7),
            Err(InvalidParams::MaxLength(19))
        );
        assert_eq!(
            GenerationParams::new(200, 2.0),
            Err(InvalidParams::Temperature(2.0))
        );
        assert!(matches!(
            GenerationParams::new(200, f64::NAN),
            Err(InvalidParams::Temperature(_))
        ));
    }

    #[test]
    fn request_trims_prompt() {
        let req = GenerateRequest::new("  to be or not  \n", GenerationParams::default());
        assert_eq!(req.prompt, "to be or not");
    }

    #[test]
    fn request_serializes_wire_shape() {
        let req = GenerateRequest::new("a rose", GenerationParams::default());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"prompt": "a rose", "max_length": 200, "temperature": 0.7})
        );
    }

    #[test]
    fn invalid_params_display() {
        assert_eq!(
            InvalidParams::MaxLength(5).to_string(),
            "max_length 5 out of range 20..=1000"
        );
    }
}
