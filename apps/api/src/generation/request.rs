//! Value types for one generation request and the local validation gate
//! that runs before any billed call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_RESUME_CHARS: usize = 50;
pub const MIN_JOB_DESCRIPTION_CHARS: usize = 100;
pub const MAX_TEMPERATURE: f32 = 2.0;

/// What the caller wants generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    CoverLetter,
    BulletEnhancement,
    MatchAnalysis,
}

impl GenerationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::CoverLetter => "cover_letter",
            GenerationKind::BulletEnhancement => "bullet_enhancement",
            GenerationKind::MatchAnalysis => "match_analysis",
        }
    }

    /// File name offered when the caller downloads the generated text.
    pub fn download_file_name(self) -> &'static str {
        match self {
            GenerationKind::CoverLetter => "cover_letter.txt",
            GenerationKind::BulletEnhancement => "enhanced_resume_bullets.txt",
            GenerationKind::MatchAnalysis => "match_analysis.txt",
        }
    }

    /// Output length and sampling temperature used when configuration does not override them.
    pub fn default_max_tokens(self) -> u32 {
        match self {
            GenerationKind::BulletEnhancement => 1000,
            GenerationKind::CoverLetter | GenerationKind::MatchAnalysis => 800,
        }
    }

    pub fn default_temperature(self) -> f32 {
        match self {
            GenerationKind::MatchAnalysis => 0.5,
            GenerationKind::CoverLetter | GenerationKind::BulletEnhancement => 0.7,
        }
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote model settings for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::EmptyModel);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub resume_text: String,
    pub job_description: String,
    pub kind: GenerationKind,
    pub model_params: ModelParams,
}

impl GenerationRequest {
    /// Rejects inputs too short to produce anything useful. Lengths are measured
    /// in characters after trimming surrounding whitespace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let resume_chars = self.resume_text.trim().chars().count();
        if resume_chars < MIN_RESUME_CHARS {
            return Err(ValidationError::ResumeTooShort {
                actual: resume_chars,
            });
        }

        let job_chars = self.job_description.trim().chars().count();
        if job_chars < MIN_JOB_DESCRIPTION_CHARS {
            return Err(ValidationError::JobDescriptionTooShort { actual: job_chars });
        }

        self.model_params.validate()
    }
}

/// Generated text together with what was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub kind: GenerationKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error(
        "Resume text is too short ({actual} characters, need at least {min}). Please upload a complete resume.",
        min = MIN_RESUME_CHARS
    )]
    ResumeTooShort { actual: usize },

    #[error(
        "Job description is too short ({actual} characters, need at least {min}). Please provide a complete job posting.",
        min = MIN_JOB_DESCRIPTION_CHARS
    )]
    JobDescriptionTooShort { actual: usize },

    #[error("Model identifier must not be empty")]
    EmptyModel,

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("temperature must be between 0 and {max}, got {0}", max = MAX_TEMPERATURE)]
    InvalidTemperature(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 800,
            temperature: 0.7,
        }
    }

    fn request(resume: &str, job: &str) -> GenerationRequest {
        GenerationRequest {
            resume_text: resume.to_string(),
            job_description: job.to_string(),
            kind: GenerationKind::CoverLetter,
            model_params: params(),
        }
    }

    #[test]
    fn test_short_resume_is_rejected() {
        let err = request(&"r".repeat(10), &"j".repeat(200)).validate().unwrap_err();
        assert_eq!(err, ValidationError::ResumeTooShort { actual: 10 });
    }

    #[test]
    fn test_short_job_description_is_rejected() {
        let err = request(&"r".repeat(60), &"j".repeat(99)).validate().unwrap_err();
        assert_eq!(err, ValidationError::JobDescriptionTooShort { actual: 99 });
    }

    #[test]
    fn test_lengths_are_measured_after_trimming() {
        let padded = format!("   {}   ", "r".repeat(49));
        let err = request(&padded, &"j".repeat(100)).validate().unwrap_err();
        assert_eq!(err, ValidationError::ResumeTooShort { actual: 49 });
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        // 50 two-byte characters pass the 50-character minimum.
        let resume = "é".repeat(50);
        assert!(request(&resume, &"j".repeat(100)).validate().is_ok());
    }

    #[test]
    fn test_boundary_lengths_pass() {
        assert!(request(&"r".repeat(50), &"j".repeat(100)).validate().is_ok());
    }

    #[test]
    fn test_model_params_ranges() {
        let mut p = params();
        p.max_tokens = 0;
        assert_eq!(p.validate(), Err(ValidationError::InvalidMaxTokens));

        let mut p = params();
        p.temperature = 2.5;
        assert_eq!(p.validate(), Err(ValidationError::InvalidTemperature(2.5)));

        let mut p = params();
        p.temperature = 2.0;
        assert!(p.validate().is_ok());

        let mut p = params();
        p.model = "  ".to_string();
        assert_eq!(p.validate(), Err(ValidationError::EmptyModel));
    }

    #[test]
    fn test_kind_serde_is_snake_case() {
        let kind: GenerationKind = serde_json::from_str(r#""bullet_enhancement""#).unwrap();
        assert_eq!(kind, GenerationKind::BulletEnhancement);
        assert_eq!(
            serde_json::to_string(&GenerationKind::MatchAnalysis).unwrap(),
            r#""match_analysis""#
        );
    }

    #[test]
    fn test_kind_defaults() {
        assert_eq!(GenerationKind::CoverLetter.default_max_tokens(), 800);
        assert_eq!(GenerationKind::BulletEnhancement.default_max_tokens(), 1000);
        assert!((GenerationKind::MatchAnalysis.default_temperature() - 0.5).abs() < f32::EPSILON);
        assert_eq!(
            GenerationKind::BulletEnhancement.download_file_name(),
            "enhanced_resume_bullets.txt"
        );
    }
}
