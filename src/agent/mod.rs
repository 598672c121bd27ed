//! Agent module — conversation routing, the therapy persona, commands and
//! exercises, and the main companion loop.

pub mod commands;
pub mod companion;
pub mod exercises;
pub mod router;
pub mod therapy;

pub use commands::{Command, CommandParser};
pub use companion::Companion;
pub use exercises::{Exercise, ExerciseGuide, ExerciseStep};
pub use router::ConversationRouter;
pub use therapy::TherapyResponder;
