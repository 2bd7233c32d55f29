//! Static interviewer persona catalog and greeting templates.

use super::models::{PersonaDefinition, PersonaId};

static CATALOG: [PersonaDefinition; 5] = [
    PersonaDefinition {
        id: PersonaId::HrFriendly,
        name: "Sarah Chen",
        description: "Warm and encouraging HR manager who focuses on getting to know you as a person. Creates a comfortable environment to discuss your background and motivations.",
        style: "Supportive and conversational",
        difficulty: "Easy",
        voice_id: "21m00Tcm4TlvDq8ikWAM",
    },
    PersonaDefinition {
        id: PersonaId::ManagerCritical,
        name: "Robert Martinez",
        description: "Experienced hiring manager with high standards. Asks challenging questions about your experience and expects detailed, well-thought-out responses.",
        style: "Direct and analytical",
        difficulty: "Hard",
        voice_id: "8sZxD42zKDvoEXNxBTdX",
    },
    PersonaDefinition {
        id: PersonaId::TechExpert,
        name: "Dr. Emily Watson",
        description: "Technical lead with deep expertise. Focuses on problem-solving abilities, technical knowledge, and how you approach complex challenges.",
        style: "Technical and precise",
        difficulty: "Medium",
        voice_id: "pNInz6obpgDQGcFmaJgB",
    },
    PersonaDefinition {
        id: PersonaId::StressInterviewer,
        name: "Marcus Thompson",
        description: "Tests your performance under pressure with rapid-fire questions and challenging scenarios. Designed to see how you handle stress and think on your feet.",
        style: "Intense and fast-paced",
        difficulty: "Hard",
        voice_id: "DMyrgzQFny3JI1Y1paM5",
    },
    PersonaDefinition {
        id: PersonaId::CeoExecutive,
        name: "James Wilson",
        description: "Senior executive who evaluates strategic thinking and leadership potential. Focuses on big-picture thinking and cultural fit at the executive level.",
        style: "Strategic and visionary",
        difficulty: "Medium",
        voice_id: "TX3LPaxmHKxFdv7VOQHJ",
    },
];

/// Read-only persona catalog, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PersonaCatalog;

impl PersonaCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn all(&self) -> &'static [PersonaDefinition] {
        &CATALOG
    }

    pub fn get(&self, id: PersonaId) -> &'static PersonaDefinition {
        // CATALOG is declared in PersonaId::ALL order
        &CATALOG[PersonaId::ALL.iter().position(|p| *p == id).unwrap_or(0)]
    }

    pub fn voice_for(&self, id: PersonaId) -> &'static str {
        self.get(id).voice_id
    }

    /// Static opening line for a persona.
    pub fn greeting(&self, id: PersonaId) -> String {
        let name = self.get(id).name;
        match id {
            PersonaId::HrFriendly => format!(
                "Hello! I'm {}, and I'm excited to speak with you today. How are you feeling about this interview?",
                name
            ),
            PersonaId::ManagerCritical => format!(
                "Good day. I'm {}, the hiring manager for this position. Let's dive right in - tell me about your most relevant experience for this role.",
                name
            ),
            PersonaId::TechExpert => format!(
                "Hi there, I'm {}. I'll be evaluating your technical skills today. Are you ready to discuss some challenging problems?",
                name
            ),
            PersonaId::StressInterviewer => format!(
                "I'm {}. This will be a fast-paced interview - I hope you're prepared. What's your biggest weakness?",
                name
            ),
            PersonaId::CeoExecutive => format!(
                "Welcome. I'm {}, and I'm here to understand your strategic thinking. What's your vision for this industry in the next 5 years?",
                name
            ),
        }
    }
}
