//! # Interview Data Model
//!
//! Types shared by the session store, the turn orchestrator, the feedback step and the
//! HTTP layer. Wire names (`"hr-friendly"`, `"first-round"`, `"interviewer"`, ...) are
//! fixed by the client and must not change.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Category of interview being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewType {
    FirstRound,
    FinalRound,
    Technical,
    CulturalFit,
    General,
    SalaryNegotiation,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::FirstRound => "first-round",
            InterviewType::FinalRound => "final-round",
            InterviewType::Technical => "technical",
            InterviewType::CulturalFit => "cultural-fit",
            InterviewType::General => "general",
            InterviewType::SalaryNegotiation => "salary-negotiation",
        }
    }

    /// Human-readable title, e.g. `"Salary Negotiation"`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interview length tier. Each tier implies a target number of interviewer questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewLength {
    /// 5-10 minutes
    Quick,
    /// 25-30 minutes
    Standard,
    /// 45-60 minutes
    Extended,
}

impl InterviewLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewLength::Quick => "quick",
            InterviewLength::Standard => "standard",
            InterviewLength::Extended => "extended",
        }
    }

    pub fn target_question_count(&self) -> u32 {
        match self {
            InterviewLength::Quick => 3,
            InterviewLength::Standard => 6,
            InterviewLength::Extended => 10,
        }
    }
}

impl fmt::Display for InterviewLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selector into the static persona catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaId {
    HrFriendly,
    ManagerCritical,
    TechExpert,
    StressInterviewer,
    CeoExecutive,
}

impl PersonaId {
    pub const ALL: [PersonaId; 5] = [
        PersonaId::HrFriendly,
        PersonaId::ManagerCritical,
        PersonaId::TechExpert,
        PersonaId::StressInterviewer,
        PersonaId::CeoExecutive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaId::HrFriendly => "hr-friendly",
            PersonaId::ManagerCritical => "manager-critical",
            PersonaId::TechExpert => "tech-expert",
            PersonaId::StressInterviewer => "stress-interviewer",
            PersonaId::CeoExecutive => "ceo-executive",
        }
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a session.
///
/// ## State Transitions:
/// PENDING → ACTIVE → COMPLETED (linear). There is no failure state: every
/// collaborator failure degrades instead of ending the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }

    /// PENDING and ACTIVE sessions count against the concurrency ceiling.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Pending | SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    Interviewer,
    Candidate,
}

/// Validated input bundle supplied at session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    pub persona_id: PersonaId,
    pub interview_type: InterviewType,
    pub interview_length: InterviewLength,
    pub job_description: String,
    #[serde(default)]
    pub cv_text: Option<String>,
}

impl InterviewConfig {
    pub const JOB_DESCRIPTION_MIN_CHARS: usize = 10;
    pub const JOB_DESCRIPTION_MAX_CHARS: usize = 2000;

    /// Check the length bounds on the job description.
    ///
    /// Persona, type and length are already guaranteed by deserialization into enums.
    pub fn validate(&self) -> AppResult<()> {
        let chars = self.job_description.chars().count();
        if chars < Self::JOB_DESCRIPTION_MIN_CHARS {
            return Err(AppError::ValidationError(format!(
                "job_description must be at least {} characters",
                Self::JOB_DESCRIPTION_MIN_CHARS
            )));
        }
        if chars > Self::JOB_DESCRIPTION_MAX_CHARS {
            return Err(AppError::ValidationError(format!(
                "job_description must be at most {} characters",
                Self::JOB_DESCRIPTION_MAX_CHARS
            )));
        }
        Ok(())
    }
}

/// One immutable entry of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub audio_url: Option<String>,
}

impl ConversationMessage {
    pub fn new(role: ConversationRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            audio_url: None,
        }
    }

    pub fn candidate(content: impl Into<String>) -> Self {
        Self::new(ConversationRole::Candidate, content)
    }

    pub fn interviewer(content: impl Into<String>) -> Self {
        Self::new(ConversationRole::Interviewer, content)
    }
}

/// The unit of interview state.
///
/// Fields are private so that the only mutation paths are the typed transitions
/// below, which keep `question_count` and `current_question` consistent with history.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    session_id: String,
    config: InterviewConfig,
    status: SessionStatus,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    conversation_history: Vec<ConversationMessage>,
    current_question: Option<String>,
    question_count: u32,
}

impl InterviewSession {
    pub fn new(session_id: String, config: InterviewConfig) -> Self {
        Self {
            session_id,
            config,
            status: SessionStatus::Pending,
            start_time: None,
            end_time: None,
            conversation_history: Vec::new(),
            current_question: None,
            question_count: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.conversation_history
    }

    /// The most recent `window` entries, oldest first.
    pub fn recent_history(&self, window: usize) -> &[ConversationMessage] {
        let start = self.conversation_history.len().saturating_sub(window);
        &self.conversation_history[start..]
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    /// PENDING → ACTIVE. Repeat calls re-stamp `start_time`.
    ///
    /// `end_time` is only set while COMPLETED, so re-activating clears it.
    pub(crate) fn activate(&mut self, at: DateTime<Utc>) {
        self.status = SessionStatus::Active;
        self.start_time = Some(at);
        self.end_time = None;
    }

    /// Any → COMPLETED. Repeat calls re-stamp `end_time`.
    ///
    /// A session that was never activated gets its start stamped too, so that
    /// `start_time` is only ever unset while PENDING.
    pub(crate) fn complete(&mut self, at: DateTime<Utc>) {
        if self.start_time.is_none() {
            self.start_time = Some(at);
        }
        self.status = SessionStatus::Completed;
        self.end_time = Some(at);
    }

    pub(crate) fn append(&mut self, message: ConversationMessage) {
        if message.role == ConversationRole::Interviewer {
            self.current_question = Some(message.content.clone());
            self.question_count += 1;
        }
        self.conversation_history.push(message);
    }

    /// Elapsed seconds from activation to completion (or to `now` while running).
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        match self.start_time {
            Some(start) => {
                let end = self.end_time.unwrap_or(now);
                end.signed_duration_since(start).num_seconds().max(0)
            }
            None => 0,
        }
    }

    /// Elapsed time formatted as `MM:SS`, `"00:00"` before activation.
    pub fn duration_string(&self, now: DateTime<Utc>) -> String {
        format_duration(self.elapsed_seconds(now))
    }
}

/// Format whole seconds as zero-padded `MM:SS`. Minutes keep growing past 99.
pub fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Static catalog entry describing an interviewer personality.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaDefinition {
    pub id: PersonaId,
    pub name: &'static str,
    pub description: &'static str,
    pub style: &'static str,
    pub difficulty: &'static str,
    pub voice_id: &'static str,
}

/// End-of-session evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewFeedback {
    pub session_id: String,
    /// `confidence`, `clarity` and `overall_fit`, each in 0-10
    pub scores: HashMap<String, f64>,
    pub improvements: Vec<String>,
    pub conversation_summary: String,
    /// `MM:SS`
    pub duration: String,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStartResponse {
    pub session_id: String,
    pub initial_greeting: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub question_count: u32,
    pub duration: String,
    pub current_question: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageReplyResponse {
    pub response: String,
    pub question_count: u32,
    pub session_status: SessionStatus,
}
