//! Prefix commands (`!menu`, `!breathe`, ...).
//!
//! Commands never reach the conversation router; they are answered
//! directly by the companion.

use super::exercises::Exercise;

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the exercise menu.
    Menu,
    /// List available commands.
    Help,
    /// Run one exercise.
    Exercise(Exercise),
    /// Prefixed, but not a known command.
    Unknown(String),
}

/// Parses prefixed messages into [`Command`]s.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `content` should be handled as a command.
    pub fn is_command(&self, content: &str) -> bool {
        !self.prefix.is_empty() && content.trim_start().starts_with(&self.prefix)
    }

    /// Parse `content`, or `None` when it is ordinary conversation.
    pub fn parse(&self, content: &str) -> Option<Command> {
        if !self.is_command(content) {
            return None;
        }
        let body = content.trim_start()[self.prefix.len()..].trim();
        let name = body.split_whitespace().next().unwrap_or("").to_lowercase();

        let command = match name.as_str() {
            "menu" | "exercises" => Command::Menu,
            "help" | "?" => Command::Help,
            other => match other.parse::<Exercise>() {
                Ok(exercise) => Command::Exercise(exercise),
                Err(_) => Command::Unknown(name),
            },
        };
        Some(command)
    }

    /// Text listing every command.
    pub fn help_text(&self) -> String {
        let p = &self.prefix;
        let mut lines = vec![
            "Here's what you can ask me:".to_string(),
            format!("{p}menu: show the exercise menu"),
            format!("{p}help: show this list"),
        ];
        lines.extend(
            Exercise::ALL
                .iter()
                .map(|e| format!("{p}{}: {}", e.command(), e.label())),
        );
        lines.push("Anything else, just talk to me 🌱".to_string());
        lines.join("\n")
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new("!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_text_is_not_a_command() {
        let parser = CommandParser::default();
        assert_eq!(parser.parse("hello there"), None);
        assert_eq!(parser.parse("wow!"), None);
    }

    #[test]
    fn parses_menu_and_help() {
        let parser = CommandParser::default();
        assert_eq!(parser.parse("!menu"), Some(Command::Menu));
        assert_eq!(parser.parse("  !MENU  "), Some(Command::Menu));
        assert_eq!(parser.parse("!help"), Some(Command::Help));
    }

    #[test]
    fn parses_exercises() {
        let parser = CommandParser::default();
        assert_eq!(
            parser.parse("!breathe"),
            Some(Command::Exercise(Exercise::Breathe))
        );
        assert_eq!(
            parser.parse("!gratitude please"),
            Some(Command::Exercise(Exercise::Gratitude))
        );
    }

    #[test]
    fn unknown_command_keeps_name() {
        let parser = CommandParser::default();
        assert_eq!(
            parser.parse("!dance"),
            Some(Command::Unknown("dance".into()))
        );
        assert_eq!(parser.parse("!"), Some(Command::Unknown(String::new())));
    }

    #[test]
    fn custom_prefix() {
        let parser = CommandParser::new("/");
        assert_eq!(parser.parse("/menu"), Some(Command::Menu));
        assert_eq!(parser.parse("!menu"), None);
    }

    #[test]
    fn help_lists_every_exercise() {
        let help = CommandParser::default().help_text();
        for exercise in Exercise::ALL {
            assert!(help.contains(&format!("!{}", exercise.command())));
        }
    }
}
