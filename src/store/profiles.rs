//! In-memory, per-user keyed session store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::journal::MoodJournalEntry;
use crate::onboarding::Profile;

use super::session::{SessionPhase, UserSession, UserState};

/// Read-only view of a session for status reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSnapshot {
    pub user_id: String,
    pub onboarding_completed: bool,
    pub phase: SessionPhase,
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<UserState>,
    pub conversation_turns: usize,
    pub journal_entries: usize,
}

impl SessionSnapshot {
    fn of(session: &UserSession) -> Self {
        Self {
            user_id: session.user_id.clone(),
            onboarding_completed: !session.needs_onboarding(),
            phase: session.phase,
            profile: session.profile.clone(),
            state: session.user_state(),
            conversation_turns: session.log.len(),
            journal_entries: session.log.mood_journal().len(),
        }
    }
}

/// Holds one [`UserSession`] per user.
///
/// Each session sits behind its own mutex: whoever handles a turn locks that
/// user's session for the whole turn, so two messages from the same user are
/// processed one after the other while different users never wait on each
/// other. The outer map lock is only held to look up or insert a session.
pub struct ProfileStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<UserSession>>>>,
    max_history_turns: usize,
}

impl ProfileStore {
    pub fn new(max_history_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history_turns,
        }
    }

    /// Get the session for a user, creating a fresh one at the intro stage.
    pub async fn session(&self, user_id: &str) -> Arc<Mutex<UserSession>> {
        if let Some(existing) = self.sessions.read().await.get(user_id) {
            return Arc::clone(existing);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id.to_string()).or_insert_with(|| {
            debug!(user_id = %user_id, "Creating session for new user");
            Arc::new(Mutex::new(UserSession::new(user_id, self.max_history_turns)))
        });
        Arc::clone(session)
    }

    /// Existing session, without creating one.
    pub async fn get(&self, user_id: &str) -> Option<Arc<Mutex<UserSession>>> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// True if the user is unknown or has not finished onboarding.
    pub async fn needs_onboarding(&self, user_id: &str) -> bool {
        match self.get(user_id).await {
            Some(session) => session.lock().await.needs_onboarding(),
            None => true,
        }
    }

    pub async fn profile(&self, user_id: &str) -> Option<Profile> {
        let session = self.get(user_id).await?;
        let session = session.lock().await;
        Some(session.profile.clone())
    }

    pub async fn user_state(&self, user_id: &str) -> Option<UserState> {
        let session = self.get(user_id).await?;
        let session = session.lock().await;
        session.user_state()
    }

    pub async fn snapshot(&self, user_id: &str) -> Option<SessionSnapshot> {
        let session = self.get(user_id).await?;
        let session = session.lock().await;
        Some(SessionSnapshot::of(&session))
    }

    pub async fn mood_journal(&self, user_id: &str) -> Option<Vec<MoodJournalEntry>> {
        let session = self.get(user_id).await?;
        let session = session.lock().await;
        Some(session.log.mood_journal().to_vec())
    }

    /// Formatted transcript lines for a user (empty for unknown users).
    pub async fn transcript(&self, user_id: &str) -> Vec<String> {
        match self.get(user_id).await {
            Some(session) => session.lock().await.log.transcript().collect(),
            None => Vec::new(),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::OnboardingStage;

    #[tokio::test]
    async fn unknown_user_needs_onboarding() {
        let store = ProfileStore::new(10);
        assert!(store.needs_onboarding("nobody").await);
        assert!(store.profile("nobody").await.is_none());
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn session_is_created_once() {
        let store = ProfileStore::new(10);
        let a = store.session("u1").await;
        let b = store.session("u1").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.user_count().await, 1);
        assert_eq!(
            a.lock().await.phase,
            SessionPhase::Onboarding(OnboardingStage::Intro)
        );
    }

    #[tokio::test]
    async fn completed_session_no_longer_needs_onboarding() {
        let store = ProfileStore::new(10);
        let session = store.session("u1").await;
        session.lock().await.complete_onboarding(Profile {
            name: Some("Sophie".into()),
            age: Some(20),
            location: Some("Paris".into()),
        });
        assert!(!store.needs_onboarding("u1").await);
        let snapshot = store.snapshot("u1").await.unwrap();
        assert!(snapshot.onboarding_completed);
        assert_eq!(snapshot.state.unwrap().message_count, 0);
    }

    #[tokio::test]
    async fn users_do_not_share_sessions() {
        let store = ProfileStore::new(10);
        store.session("a").await.lock().await.log.append("hi", "hello");
        assert_eq!(store.transcript("a").await.len(), 1);
        assert!(store.transcript("b").await.is_empty());
    }

    #[tokio::test]
    async fn same_user_turns_serialize_on_the_session_lock() {
        let store = Arc::new(ProfileStore::new(10));
        let session = store.session("u1").await;
        let guard = session.lock().await;

        let store2 = Arc::clone(&store);
        let waiter = tokio::spawn(async move {
            let session = store2.session("u1").await;
            let mut s = session.lock().await;
            s.message_count += 1;
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished(), "second turn must wait for the first");
        drop(guard);
        waiter.await.unwrap();
        assert_eq!(session.lock().await.message_count, 1);
    }
}
