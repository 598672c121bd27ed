//! Kindred — a supportive companion chat bot.
//!
//! New users are onboarded (name, age, location), then chat with an
//! LLM-backed persona that periodically offers to log their mood in a
//! journal and points them to self-care exercises.

pub mod agent;
pub mod api;
pub mod channels;
pub mod config;
pub mod error;
pub mod journal;
pub mod llm;
pub mod onboarding;
pub mod safety;
pub mod store;
