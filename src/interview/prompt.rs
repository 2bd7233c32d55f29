//! System prompt construction for the interviewer model.
//!
//! The prompt is a pure function of session state. The orchestrator treats it as an
//! opaque string produced through [`PromptBuilder`].

use super::models::{InterviewSession, InterviewType, PersonaId};
use super::persona::PersonaCatalog;
use std::sync::Arc;

const CV_SUMMARY_CHARS: usize = 500;

pub trait PromptBuilder: Send + Sync {
    fn build_system_prompt(&self, session: &InterviewSession) -> String;
}

/// Persona-driven prompt with interview context, candidate background and
/// conversation guidelines.
pub struct InterviewPromptBuilder {
    personas: Arc<PersonaCatalog>,
}

impl InterviewPromptBuilder {
    pub fn new(personas: Arc<PersonaCatalog>) -> Self {
        Self { personas }
    }
}

impl PromptBuilder for InterviewPromptBuilder {
    fn build_system_prompt(&self, session: &InterviewSession) -> String {
        let config = session.config();
        let persona = self.personas.get(config.persona_id);

        let mut prompt = format!(
            "You are {}, a professional interviewer with the following characteristics:\n\
             - Style: {}\n\
             - Approach: {}\n\
             \n\
             INTERVIEW CONTEXT:\n\
             - Interview Type: {}\n\
             - Interview Length: {}\n\
             - Job Description: {}\n",
            persona.name,
            persona.style,
            persona.description,
            config.interview_type.title(),
            config.interview_length,
            config.job_description,
        );

        if let Some(cv_text) = config.cv_text.as_deref().filter(|text| !text.trim().is_empty()) {
            prompt.push_str(&format!("\nCANDIDATE BACKGROUND:\n{}\n", cv_summary(cv_text)));
        }

        prompt.push_str(&format!(
            "\nINTERVIEWER INSTRUCTIONS:\n{}",
            persona_instructions(config.persona_id, config.interview_type)
        ));

        prompt.push_str(&format!(
            "\n\nCONVERSATION GUIDELINES:\n\
             - Keep responses concise (1-3 sentences max)\n\
             - Ask one question at a time\n\
             - Listen actively to the candidate's responses\n\
             - Follow up naturally based on their answers\n\
             - Maintain your persona's style throughout\n\
             - End the interview naturally after {} questions\n\
             \n\
             Current question count: {}\n",
            config.interview_length.target_question_count(),
            session.question_count(),
        ));

        prompt
    }
}

/// First 500 characters of the CV, with an ellipsis when truncated.
fn cv_summary(cv_text: &str) -> String {
    if cv_text.chars().count() > CV_SUMMARY_CHARS {
        let head: String = cv_text.chars().take(CV_SUMMARY_CHARS).collect();
        format!("{}...", head)
    } else {
        cv_text.to_string()
    }
}

fn persona_instructions(persona: PersonaId, interview_type: InterviewType) -> String {
    use InterviewType::*;

    let (base, specific) = match persona {
        PersonaId::HrFriendly => (
            "Be warm and encouraging. Focus on cultural fit, motivations, and personal experiences.",
            match interview_type {
                FirstRound => "Start with icebreaker questions and basic background.",
                CulturalFit => "Explore values, work style preferences, and team collaboration.",
                SalaryNegotiation => "Be supportive but realistic about compensation discussions.",
                _ => "",
            },
        ),
        PersonaId::ManagerCritical => (
            "Be direct and analytical. Challenge responses and dig deeper into specifics.",
            match interview_type {
                Technical => "Focus on problem-solving methodology and technical depth.",
                FinalRound => "Evaluate leadership potential and decision-making skills.",
                General => "Ask challenging behavioral questions with follow-ups.",
                _ => "",
            },
        ),
        PersonaId::TechExpert => (
            "Focus on technical competency, problem-solving approach, and system design.",
            match interview_type {
                Technical => "Ask detailed technical questions and coding problems.",
                FirstRound => "Assess fundamental technical knowledge.",
                General => "Balance technical and soft skills evaluation.",
                _ => "",
            },
        ),
        PersonaId::StressInterviewer => (
            "Create pressure through rapid-fire questions and challenging scenarios.",
            match interview_type {
                Technical => "Present complex problems with time pressure.",
                FinalRound => "Test decision-making under stress.",
                General => "Use interruptions and follow-up questions to create pressure.",
                _ => "",
            },
        ),
        PersonaId::CeoExecutive => (
            "Evaluate strategic thinking, leadership, and long-term vision.",
            match interview_type {
                FinalRound => "Focus on executive presence and strategic decision-making.",
                CulturalFit => "Assess alignment with company vision and values.",
                General => "Explore big-picture thinking and industry insights.",
                _ => "",
            },
        ),
    };

    format!("{} {}", base, specific).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::{InterviewConfig, InterviewLength};

    fn session(cv_text: Option<String>) -> InterviewSession {
        InterviewSession::new(
            "s1".to_string(),
            InterviewConfig {
                persona_id: PersonaId::ManagerCritical,
                interview_type: InterviewType::FinalRound,
                interview_length: InterviewLength::Standard,
                job_description: "Lead the payments platform team".to_string(),
                cv_text,
            },
        )
    }

    fn builder() -> InterviewPromptBuilder {
        InterviewPromptBuilder::new(Arc::new(PersonaCatalog::new()))
    }

    #[test]
    fn test_prompt_contains_persona_and_context() {
        let prompt = builder().build_system_prompt(&session(None));
        assert!(prompt.starts_with("You are Robert Martinez"));
        assert!(prompt.contains("- Interview Type: Final Round"));
        assert!(prompt.contains("- Interview Length: standard"));
        assert!(prompt.contains("Lead the payments platform team"));
        assert!(prompt.contains("Evaluate leadership potential"));
        assert!(prompt.contains("after 6 questions"));
        assert!(prompt.contains("Current question count: 0"));
        assert!(!prompt.contains("CANDIDATE BACKGROUND"));
    }

    #[test]
    fn test_long_cv_is_truncated() {
        let prompt = builder().build_system_prompt(&session(Some("a".repeat(800))));
        let expected = format!("CANDIDATE BACKGROUND:\n{}...\n", "a".repeat(500));
        assert!(prompt.contains(&expected));
    }

    #[test]
    fn test_instructions_without_type_specific_line() {
        let text = persona_instructions(PersonaId::HrFriendly, InterviewType::Technical);
        assert_eq!(
            text,
            "Be warm and encouraging. Focus on cultural fit, motivations, and personal experiences."
        );
    }
}
