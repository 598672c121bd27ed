//! Conversation log and mood journaling.

pub mod log;
pub mod mood;
pub mod pipeline;

pub use log::{ConversationEntry, ConversationLog};
pub use mood::{Mood, MoodJournalEntry};
pub use pipeline::MoodPipeline;
