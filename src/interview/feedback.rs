//! End-of-session feedback.
//!
//! The language model is asked for a fixed JSON shape. Whatever comes back, a complete
//! [`InterviewFeedback`] is always produced: missing fields fall back one by one, and an
//! unusable response (call failure, timeout, not JSON) falls back as a whole.

use super::models::{ConversationRole, InterviewFeedback, InterviewSession};
use super::session::SessionManager;
use crate::pipeline::{with_timeout, GenerationRequest, ReplyGenerator};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const SCORE_DIMENSIONS: [&str; 3] = ["confidence", "clarity", "overall_fit"];
const DEFAULT_SCORE: f64 = 7.0;

const FALLBACK_IMPROVEMENTS: [&str; 3] = [
    "Practice speaking more confidently during interviews",
    "Provide more specific examples when discussing experience",
    "Work on structuring responses more clearly",
];
const FALLBACK_SUMMARY: &str =
    "Interview session completed. Continue practicing to improve your skills.";

// Used when the response parsed but left a field out.
const MISSING_IMPROVEMENTS: [&str; 3] = [
    "Practice speaking more confidently",
    "Provide more specific examples",
    "Improve technical communication",
];
const MISSING_SUMMARY: &str = "Interview completed successfully.";

/// The evaluation fields extracted from a model response.
#[derive(Debug, Clone, PartialEq)]
struct Evaluation {
    scores: HashMap<String, f64>,
    improvements: Vec<String>,
    conversation_summary: String,
}

impl Evaluation {
    fn fallback() -> Self {
        Self {
            scores: default_scores(),
            improvements: FALLBACK_IMPROVEMENTS.iter().map(|s| s.to_string()).collect(),
            conversation_summary: FALLBACK_SUMMARY.to_string(),
        }
    }
}

fn default_scores() -> HashMap<String, f64> {
    SCORE_DIMENSIONS
        .iter()
        .map(|name| (name.to_string(), DEFAULT_SCORE))
        .collect()
}

pub struct FeedbackSynthesizer {
    sessions: Arc<SessionManager>,
    generator: Arc<dyn ReplyGenerator>,
    timeout: Duration,
    max_tokens: u32,
}

impl FeedbackSynthesizer {
    pub fn new(
        sessions: Arc<SessionManager>,
        generator: Arc<dyn ReplyGenerator>,
        timeout: Duration,
        max_tokens: u32,
    ) -> Self {
        Self {
            sessions,
            generator,
            timeout,
            max_tokens,
        }
    }

    /// Evaluate a finished session. Never fails.
    pub async fn generate(&self, session: &InterviewSession) -> InterviewFeedback {
        let request = GenerationRequest::analysis(feedback_prompt(session), self.max_tokens);

        let call = self.generator.generate(request);
        let evaluation = match with_timeout("feedback", self.timeout, call).await {
            Ok(raw) => parse_evaluation(&raw).unwrap_or_else(|| {
                warn!(
                    session_id = %session.session_id(),
                    "Feedback response was not valid JSON, using default feedback"
                );
                Evaluation::fallback()
            }),
            Err(err) => {
                warn!(
                    session_id = %session.session_id(),
                    error = %err,
                    "Feedback generation failed, using default feedback"
                );
                Evaluation::fallback()
            }
        };

        info!(
            session_id = %session.session_id(),
            questions = session.question_count(),
            "Feedback generated"
        );

        InterviewFeedback {
            session_id: session.session_id().to_string(),
            scores: evaluation.scores,
            improvements: evaluation.improvements,
            conversation_summary: evaluation.conversation_summary,
            duration: self.sessions.duration_string(session.session_id()),
            total_questions: session.question_count(),
            completed_at: Utc::now(),
        }
    }
}

fn feedback_prompt(session: &InterviewSession) -> String {
    let conversation: String = session
        .history()
        .iter()
        .map(|message| {
            let speaker = match message.role {
                ConversationRole::Interviewer => "Interviewer",
                ConversationRole::Candidate => "Candidate",
            };
            format!("{}: {}\n", speaker, message.content)
        })
        .collect();

    let config = session.config();
    format!(
        r#"You are an expert interview coach. Analyze this interview conversation and provide detailed feedback.

Job Description: {}
Interview Type: {}
Persona: {}

Conversation:
{}
Please provide feedback in this exact JSON format:
{{
    "confidence": <score 0-10>,
    "clarity": <score 0-10>,
    "overall_fit": <score 0-10>,
    "improvements": [
        "Specific improvement suggestion 1",
        "Specific improvement suggestion 2",
        "Specific improvement suggestion 3"
    ],
    "conversation_summary": "Brief summary of the candidate's performance and key points discussed"
}}

Scoring criteria:
- Confidence: Body language, tone, assertiveness, hesitation
- Clarity: Communication skills, structure, articulation
- Overall_fit: Relevant experience, cultural alignment, role suitability

Focus on actionable, specific feedback that will help the candidate improve.
"#,
        config.job_description, config.interview_type, config.persona_id, conversation
    )
}

/// Models often wrap JSON in a Markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// `None` when the response is not a JSON object at all.
fn parse_evaluation(raw: &str) -> Option<Evaluation> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    let object = value.as_object()?;

    // Scores may be nested under "scores" or sit at the top level.
    let score_source = object
        .get("scores")
        .and_then(Value::as_object)
        .unwrap_or(object);
    let scores = SCORE_DIMENSIONS
        .iter()
        .map(|name| {
            let score = score_source
                .get(*name)
                .and_then(Value::as_f64)
                .map(|s| s.clamp(0.0, 10.0))
                .unwrap_or(DEFAULT_SCORE);
            (name.to_string(), score)
        })
        .collect();

    let improvements = object
        .get("improvements")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
        .unwrap_or_else(|| MISSING_IMPROVEMENTS.iter().map(|s| s.to_string()).collect());

    let conversation_summary = object
        .get("conversation_summary")
        .and_then(Value::as_str)
        .filter(|summary| !summary.trim().is_empty())
        .unwrap_or(MISSING_SUMMARY)
        .to_string();

    Some(Evaluation {
        scores,
        improvements,
        conversation_summary,
    })
}
