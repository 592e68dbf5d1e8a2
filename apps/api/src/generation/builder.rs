//! Prompt builder: turns a validated `GenerationRequest` into the system role and
//! user prompt sent to the completion endpoint.
//!
//! Pure and deterministic: the same request always yields the same prompt. Inputs are
//! never truncated; oversized inputs only produce a `PromptWarning`.

use serde::Serialize;
use tracing::warn;

use crate::generation::prompts::{
    BULLET_ENHANCEMENT_SYSTEM, BULLET_ENHANCEMENT_TEMPLATE, COVER_LETTER_SYSTEM,
    COVER_LETTER_TEMPLATE, MATCH_ANALYSIS_SYSTEM, MATCH_ANALYSIS_TEMPLATE,
};
use crate::generation::request::{GenerationKind, GenerationRequest};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, PLAIN_TEXT_INSTRUCTION};

/// Combined resume + job description length above which the remote model may truncate.
pub const DEFAULT_SOFT_LIMIT_CHARS: usize = 12_000;

/// Non-blocking annotation attached to a built prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptWarning {
    InputExceedsSoftLimit { input_chars: usize, soft_limit: usize },
}

impl std::fmt::Display for PromptWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptWarning::InputExceedsSoftLimit {
                input_chars,
                soft_limit,
            } => write!(
                f,
                "Combined input is {input_chars} characters (soft limit {soft_limit}); the model may truncate it"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system_role: &'static str,
    pub user_prompt: String,
    pub warnings: Vec<PromptWarning>,
}

#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    soft_limit_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SOFT_LIMIT_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(soft_limit_chars: usize) -> Self {
        Self { soft_limit_chars }
    }

    pub fn build(&self, request: &GenerationRequest) -> BuiltPrompt {
        let (system_role, template) = template_for(request.kind);

        let user_prompt = fill_template(
            template,
            &[
                ("resume_text", request.resume_text.as_str()),
                ("job_description", request.job_description.as_str()),
                ("grounding_instruction", GROUNDING_INSTRUCTION),
                ("plain_text_instruction", PLAIN_TEXT_INSTRUCTION),
            ],
        );

        let input_chars =
            request.resume_text.chars().count() + request.job_description.chars().count();
        let mut warnings = Vec::new();
        if input_chars > self.soft_limit_chars {
            let warning = PromptWarning::InputExceedsSoftLimit {
                input_chars,
                soft_limit: self.soft_limit_chars,
            };
            warn!(kind = %request.kind, "{warning}");
            warnings.push(warning);
        }

        BuiltPrompt {
            system_role,
            user_prompt,
            warnings,
        }
    }
}

fn template_for(kind: GenerationKind) -> (&'static str, &'static str) {
    match kind {
        GenerationKind::CoverLetter => (COVER_LETTER_SYSTEM, COVER_LETTER_TEMPLATE),
        GenerationKind::BulletEnhancement => {
            (BULLET_ENHANCEMENT_SYSTEM, BULLET_ENHANCEMENT_TEMPLATE)
        }
        GenerationKind::MatchAnalysis => (MATCH_ANALYSIS_SYSTEM, MATCH_ANALYSIS_TEMPLATE),
    }
}

/// Replaces `{key}` placeholders in a single left-to-right pass.
///
/// Substituted values are copied verbatim and never rescanned, so a resume that
/// happens to contain `{job_description}` stays as written. Unknown `{...}`
/// sequences are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let capacity = template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after_brace = &rest[start + 1..];

        let substitution = values.iter().find_map(|(key, value)| {
            after_brace
                .strip_prefix(key)
                .and_then(|tail| tail.strip_prefix('}'))
                .map(|tail| (*value, tail))
        });

        match substitution {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after_brace;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::request::ModelParams;

    fn request(kind: GenerationKind, resume: &str, job: &str) -> GenerationRequest {
        GenerationRequest {
            resume_text: resume.to_string(),
            job_description: job.to_string(),
            kind,
            model_params: ModelParams {
                model: "gpt-4o-mini".to_string(),
                max_tokens: 800,
                temperature: 0.7,
            },
        }
    }

    #[test]
    fn test_bullet_prompt_contains_inputs_and_bullet_range() {
        let built = PromptBuilder::default().build(&request(GenerationKind::BulletEnhancement, "R", "J"));
        assert!(built.user_prompt.contains("CURRENT RESUME:\nR\n"));
        assert!(built.user_prompt.contains("TARGET JOB DESCRIPTION:\nJ\n"));
        assert!(built.user_prompt.contains("5-8"));
        assert!(built.user_prompt.contains("action verb"));
        assert!(built.user_prompt.contains("STAR"));
        assert!(built.user_prompt.contains("rationale"));
        assert_eq!(built.system_role, BULLET_ENHANCEMENT_SYSTEM);
    }

    #[test]
    fn test_cover_letter_prompt_mandates_salutation_and_closing() {
        let built = PromptBuilder::default().build(&request(GenerationKind::CoverLetter, "resume", "job"));
        assert!(built.user_prompt.contains("\"Dear Hiring Manager,\""));
        assert!(built.user_prompt.contains("\"Sincerely,\""));
        assert!(built.user_prompt.contains("[Your Name]"));
        assert!(built.user_prompt.contains("3-4 paragraphs"));
        assert!(built.user_prompt.contains(GROUNDING_INSTRUCTION));
        assert!(built.user_prompt.contains(PLAIN_TEXT_INSTRUCTION));
    }

    #[test]
    fn test_match_analysis_prompt_sections() {
        let built = PromptBuilder::default().build(&request(GenerationKind::MatchAnalysis, "resume", "job"));
        for phrase in ["0-100", "Top 5 strengths", "Top 3 gaps", "Keywords", "overall recommendation"] {
            assert!(built.user_prompt.contains(phrase), "missing {phrase}");
        }
        assert_eq!(built.system_role, MATCH_ANALYSIS_SYSTEM);
    }

    #[test]
    fn test_no_placeholders_survive() {
        for kind in [
            GenerationKind::CoverLetter,
            GenerationKind::BulletEnhancement,
            GenerationKind::MatchAnalysis,
        ] {
            let built = PromptBuilder::default().build(&request(kind, "resume", "job"));
            assert!(!built.user_prompt.contains("{resume_text}"));
            assert!(!built.user_prompt.contains("{job_description}"));
            assert!(!built.user_prompt.contains("{grounding_instruction}"));
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::default();
        let req = request(GenerationKind::CoverLetter, "Rust engineer, 7 years", "Senior Rust role");
        assert_eq!(builder.build(&req), builder.build(&req));
    }

    #[test]
    fn test_inputs_are_interpolated_verbatim() {
        let resume = "Built {job_description} parser & <xml> \"quoted\"";
        let built = PromptBuilder::default().build(&request(GenerationKind::CoverLetter, resume, "JD"));
        assert!(built.user_prompt.contains(resume));
        assert_eq!(built.user_prompt.matches("JD").count(), 1);
    }

    #[test]
    fn test_soft_limit_warns_without_truncating() {
        let resume = "r".repeat(70);
        let job = "j".repeat(40);
        let built = PromptBuilder::new(100).build(&request(GenerationKind::CoverLetter, &resume, &job));
        assert_eq!(
            built.warnings,
            vec![PromptWarning::InputExceedsSoftLimit {
                input_chars: 110,
                soft_limit: 100
            }]
        );
        assert!(built.user_prompt.contains(&resume));
        assert!(built.user_prompt.contains(&job));
    }

    #[test]
    fn test_soft_limit_warning_message() {
        let warning = PromptWarning::InputExceedsSoftLimit {
            input_chars: 15_000,
            soft_limit: 12_000,
        };
        assert_eq!(
            warning.to_string(),
            "Combined input is 15000 characters (soft limit 12000); the model may truncate it"
        );
    }

    #[test]
    fn test_within_soft_limit_has_no_warnings() {
        let built = PromptBuilder::new(100).build(&request(GenerationKind::CoverLetter, "r", "j"));
        assert!(built.warnings.is_empty());
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        let out = fill_template("{a} {b} {", &[("a", "x")]);
        assert_eq!(out, "x {b} {");
    }

    #[test]
    fn test_fill_template_handles_multibyte_text() {
        let out = fill_template("Zoë: {name}!", &[("name", "Ünal")]);
        assert_eq!(out, "Zoë: Ünal!");
    }
}
