//! Per-user conversation log with a retention cap.

use std::collections::VecDeque;

use serde::Serialize;

use super::mood::MoodJournalEntry;

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEntry {
    pub user_text: String,
    pub bot_text: String,
}

impl ConversationEntry {
    /// Transcript form of the exchange.
    pub fn formatted(&self) -> String {
        format!("User: {}\nBot: {}", self.user_text, self.bot_text)
    }
}

/// Exchanges and mood journal entries for one user.
///
/// Exchanges are capped at `max_turns`; when full, the oldest is evicted.
/// Journal entries are never evicted.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    entries: VecDeque<ConversationEntry>,
    max_turns: usize,
    mood_journal: Vec<MoodJournalEntry>,
}

impl ConversationLog {
    pub fn new(max_turns: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_turns: max_turns.max(1),
            mood_journal: Vec::new(),
        }
    }

    /// Append an exchange.
    pub fn append(&mut self, user_text: impl Into<String>, bot_text: impl Into<String>) {
        if self.entries.len() == self.max_turns {
            self.entries.pop_front();
        }
        self.entries.push_back(ConversationEntry {
            user_text: user_text.into(),
            bot_text: bot_text.into(),
        });
    }

    /// Formatted exchanges in insertion order. The iterator is lazy and can be
    /// cloned to restart it.
    pub fn transcript(&self) -> impl Iterator<Item = String> + Clone + '_ {
        self.entries.iter().map(ConversationEntry::formatted)
    }

    /// The whole transcript as one string.
    pub fn transcript_text(&self) -> String {
        self.transcript().collect::<Vec<_>>().join("\n\n")
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all exchanges and journal entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.mood_journal.clear();
    }

    pub fn record_mood(&mut self, entry: MoodJournalEntry) {
        self.mood_journal.push(entry);
    }

    pub fn mood_journal(&self) -> &[MoodJournalEntry] {
        &self.mood_journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_formats_in_order() {
        let mut log = ConversationLog::new(10);
        log.append("hi", "hello!");
        log.append("I'm tired", "That sounds hard.");
        let lines: Vec<String> = log.transcript().collect();
        assert_eq!(
            lines,
            vec![
                "User: hi\nBot: hello!".to_string(),
                "User: I'm tired\nBot: That sounds hard.".to_string(),
            ]
        );
    }

    #[test]
    fn transcript_is_repeatable() {
        let mut log = ConversationLog::new(10);
        log.append("a", "b");
        log.append("c", "d");
        assert_eq!(log.transcript_text(), log.transcript_text());

        let iter = log.transcript();
        let first: Vec<String> = iter.clone().collect();
        let second: Vec<String> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn oldest_entry_is_evicted_at_cap() {
        let mut log = ConversationLog::new(2);
        log.append("1", "a");
        log.append("2", "b");
        log.append("3", "c");
        assert_eq!(log.len(), 2);
        let users: Vec<&str> = log.entries().map(|e| e.user_text.as_str()).collect();
        assert_eq!(users, vec!["2", "3"]);
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        let mut log = ConversationLog::new(0);
        log.append("1", "a");
        log.append("2", "b");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut log = ConversationLog::new(10);
        log.append("same", "same");
        log.append("same", "same");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn empty_log_has_empty_transcript() {
        let log = ConversationLog::new(5);
        assert!(log.is_empty());
        assert_eq!(log.transcript_text(), "");
    }
}
