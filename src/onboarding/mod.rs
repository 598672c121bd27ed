//! Onboarding system — the first conversation with a new user.
//!
//! A new user is walked through four stages (intro, name, age, location).
//! Each reply after the intro is sent to the completion service, which pulls
//! out the field the stage is waiting for. Once all three fields are known
//! the session leaves onboarding and normal conversation begins.

pub mod extract;
pub mod manager;
pub mod model;
pub mod prompts;
pub mod state;

pub use extract::ExtractedFields;
pub use manager::{OnboardingManager, OnboardingReply};
pub use model::Profile;
pub use state::{OnboardingStage, ProfileField};
