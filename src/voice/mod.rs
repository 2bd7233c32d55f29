//! # Voice Conversation
//!
//! The duplex protocol behind `/ws/voice/{session_id}`: wire events, the registry of
//! live connections and the orchestrator that runs each interview turn.

pub mod events;
pub mod orchestrator;
pub mod registry;
