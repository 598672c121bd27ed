//! Onboarding messages and the LLM extraction instruction.

use super::model::Profile;
use super::state::OnboardingStage;

/// System instruction for pulling profile fields out of a free-text reply.
pub const EXTRACTION_INSTRUCTION: &str = r#"You are a data extraction assistant for a companion chat bot that is getting to know a new user.
Extract the following from the user's message. Omit a key (or use null) for anything not mentioned.
{
  "name": "the user's first name or preferred name, as a string",
  "age": "the user's age as an integer; convert number words such as \"twenty one\" to 21",
  "location": "where the user lives, expanded to a full place name (e.g. \"nyc\" -> \"New York City, NY\")"
}
Do not guess. If the message does not clearly contain a value, leave it out."#;

/// First message a new user receives, whatever they said.
pub fn welcome_message() -> String {
    "Hi there, I'm Kindred 🌱 I'm here to listen whenever you want to talk.\n\
     Before we start, I'd love to get to know you a little. What's your name?"
        .to_string()
}

/// Question asked after successfully entering `stage`.
pub fn stage_question(stage: OnboardingStage, profile: &Profile) -> String {
    match stage {
        OnboardingStage::Intro | OnboardingStage::Name => welcome_message(),
        OnboardingStage::Age => format!(
            "Nice to meet you, {}! How old are you?",
            profile.display_name()
        ),
        OnboardingStage::Location => "Thanks! And where are you based?".to_string(),
    }
}

/// Message sent when a reply did not contain the field `stage` needs.
pub fn reprompt(stage: OnboardingStage) -> String {
    match stage {
        OnboardingStage::Intro | OnboardingStage::Name => {
            "Sorry, I didn't quite catch your name. What should I call you?".to_string()
        }
        OnboardingStage::Age => {
            "I didn't catch your age. Could you tell me how old you are, e.g. \"25\"?".to_string()
        }
        OnboardingStage::Location => {
            "I didn't catch where you're based. Which city or country are you in?".to_string()
        }
    }
}

/// Final onboarding message listing what the companion can do.
pub fn completion_message(profile: &Profile) -> String {
    format!(
        "Thank you, {name}! You're all set 🌸\n\n\
         Here's what I can do for you:\n\
         • Chat with you about anything on your mind\n\
         • Every few messages, offer to log your mood in a journal\n\
         • Suggest self-care exercises: affirmations, breathing, mindfulness, gratitude and more\n\n\
         Type !menu at any time to see the exercises. How are you feeling today?",
        name = profile.display_name()
    )
}
