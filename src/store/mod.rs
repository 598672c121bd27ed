//! Session storage — per-user profile, phase and conversation state.
//!
//! Everything lives in memory for the lifetime of the process.

pub mod profiles;
pub mod session;

pub use profiles::{ProfileStore, SessionSnapshot};
pub use session::{SessionPhase, UserSession, UserState};
