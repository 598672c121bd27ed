//! Self-care exercises and the exercise menu.

use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::channels::{OutgoingResponse, ReplyButton};
use crate::llm::CompletionClient;

use super::therapy::FALLBACK_AFFIRMATION;

const EXERCISE_INSTRUCTION: &str =
    "You are a supportive mental health assistant. Provide uplifting and encouraging responses.";

pub const MENU_TEXT: &str = "🌸 This is your quiet corner to relax, refresh and reconnect with yourself 🌸\n\n\
                             Pick an exercise:";

pub const GRATITUDE_PROMPTS: &[&str] = &[
    "🌿 What is one thing you appreciate about yourself today? Take a moment to reflect on your strengths and how they empower you.",
    "🌿 Think of someone who has made a positive impact in your life. Write down one thing you are grateful for about them.",
    "🌿 Pause and appreciate three things in your surroundings right now. It could be as simple as the sun shining, the air you breathe, or the company you have.",
    "🌿 Reflect on a recent challenge. How did you grow from it? Write down at least one lesson you learned.",
    "🌿 What made you smile today? Take a moment to appreciate those little joyful moments.",
    "🌿 Write down three things you are grateful for today. No matter how big or small, focus on the positives in your life.",
    "🌿 Think of one person who has positively impacted your life. Send them a message of appreciation or simply reflect on their kindness.",
    "🌿 Pause for a moment. Take three deep breaths and focus on something beautiful around you. What about it makes you feel grateful?",
    "🌿 What is something that made you smile recently? Write about it and how it made you feel.",
    "🌿 What is one challenge that helped you grow? Gratitude is also about appreciating the lessons we learn from difficulties.",
];

/// The self-care exercises offered in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exercise {
    Affirmation,
    SelfCare,
    Breathe,
    Music,
    Art,
    Mindful,
    Gratitude,
    Ground,
}

impl Exercise {
    pub const ALL: [Exercise; 8] = [
        Exercise::Affirmation,
        Exercise::SelfCare,
        Exercise::Breathe,
        Exercise::Music,
        Exercise::Art,
        Exercise::Mindful,
        Exercise::Gratitude,
        Exercise::Ground,
    ];

    /// Command name (also the button's callback data).
    pub fn command(&self) -> &'static str {
        match self {
            Self::Affirmation => "affirmation",
            Self::SelfCare => "selfcare",
            Self::Breathe => "breathe",
            Self::Music => "music",
            Self::Art => "art",
            Self::Mindful => "mindful",
            Self::Gratitude => "gratitude",
            Self::Ground => "ground",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Affirmation => "Affirmation",
            Self::SelfCare => "Self Care",
            Self::Breathe => "Breathing",
            Self::Music => "Sounds of Music",
            Self::Art => "Peaceful Art",
            Self::Mindful => "Mindfulness Practice",
            Self::Gratitude => "Gratitude and Appreciation",
            Self::Ground => "Five Senses Grounding",
        }
    }

    /// Request and reply heading for exercises generated by the LLM.
    fn generated(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Affirmation => Some((
                "Give me a short, positive daily affirmation.",
                "🌟 Daily Affirmation:",
            )),
            Self::SelfCare => Some(("Give me a self-care tip.", "🌟 Self-Care Tip:")),
            Self::Music => Some((
                "Recommend two calming pieces of music for relaxation, with a short note on each.",
                "🎼 Sounds of music:",
            )),
            Self::Art => Some((
                "Recommend two peaceful artworks to look at, with a short note on each.",
                "🎨 Peaceful art:",
            )),
            Self::Mindful => Some((
                "Give me simple mindfulness tips that are not about breathing or the five senses.",
                "🧘 Mindfulness practice:",
            )),
            Self::Ground => Some((
                "Walk me through a five-senses grounding technique.",
                "🌿 Five senses grounding:",
            )),
            Self::Breathe | Self::Gratitude => None,
        }
    }
}

impl std::fmt::Display for Exercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command())
    }
}

impl std::str::FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.command() == needle)
            .ok_or_else(|| s.to_string())
    }
}

/// One timed message of a scripted exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseStep {
    /// Pause before this step is sent.
    pub delay: Duration,
    pub text: String,
}

impl ExerciseStep {
    fn new(delay_secs: u64, text: impl Into<String>) -> Self {
        Self {
            delay: Duration::from_secs(delay_secs),
            text: text.into(),
        }
    }
}

impl From<ExerciseStep> for OutgoingResponse {
    fn from(step: ExerciseStep) -> Self {
        let response = OutgoingResponse::text(step.text);
        if step.delay.is_zero() {
            response
        } else {
            response.with_delay(step.delay)
        }
    }
}

/// The breathing script: inhale 6 s, hold 3 s, exhale 6 s, one message a second.
pub fn breathing_steps() -> Vec<ExerciseStep> {
    let phases = [
        (1, "🌿 Inhale... Take a deep breath in.", 6, "inhale"),
        (0, "🌿 Hold your breath...", 3, "hold"),
        (0, "🌿 Exhale... Slowly breathe out.", 6, "exhale"),
    ];

    let mut steps = vec![ExerciseStep::new(0, "🌿 Breathing exercise started!")];
    for (delay, intro, secs, verb) in phases {
        steps.push(ExerciseStep::new(delay, intro));
        for left in (1..=secs).rev() {
            steps.push(ExerciseStep::new(1, format!("{left} seconds left to {verb}")));
        }
    }
    steps.push(ExerciseStep::new(0, "🌟 Fantastic! You completed the breathing exercise."));
    steps
}

/// Buttons for every exercise.
pub fn menu_buttons() -> Vec<ReplyButton> {
    Exercise::ALL
        .iter()
        .map(|e| ReplyButton::new(e.label(), e.command()))
        .collect()
}

/// Runs exercises.
#[derive(Clone)]
pub struct ExerciseGuide {
    client: CompletionClient,
}

impl ExerciseGuide {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// The exercise menu, introduced by `intro`.
    pub fn menu(intro: &str) -> OutgoingResponse {
        OutgoingResponse::text(intro).with_buttons(menu_buttons())
    }

    /// Run one exercise and return the messages to send, in order.
    pub async fn run(&self, exercise: Exercise) -> Vec<OutgoingResponse> {
        info!(exercise = %exercise, "Running exercise");
        match exercise {
            Exercise::Breathe => breathing_steps().into_iter().map(Into::into).collect(),
            Exercise::Gratitude => {
                let prompt = GRATITUDE_PROMPTS
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(GRATITUDE_PROMPTS[0]);
                vec![OutgoingResponse::text(format!(
                    "Gratitude and Appreciation: {prompt}"
                ))]
            }
            other => {
                let Some((request, heading)) = other.generated() else {
                    return vec![OutgoingResponse::text(FALLBACK_AFFIRMATION)];
                };
                match self.client.complete(EXERCISE_INSTRUCTION, request).await {
                    Ok(text) if !text.is_empty() => {
                        vec![OutgoingResponse::text(format!("{heading} {text}"))]
                    }
                    Ok(_) => vec![OutgoingResponse::text(FALLBACK_AFFIRMATION)],
                    Err(e) => {
                        warn!(exercise = %other, error = %e, "Exercise generation failed");
                        vec![OutgoingResponse::text(FALLBACK_AFFIRMATION)]
                    }
                }
            }
        }
    }
}
