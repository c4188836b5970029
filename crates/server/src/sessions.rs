//! Server-hosted training sessions, one per user.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use lesson_core::{ExerciseCompleted, TrainingSession};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    sessions: HashMap<i64, TrainingSession>,
    /// Completions not yet persisted, oldest first.
    pending: HashMap<i64, Vec<ExerciseCompleted>>,
}

/// Shared map from user id to that user's open session.
///
/// Handlers lock it only for the synchronous runner call; anything that
/// awaits the database happens after the guard is dropped.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub persisted: usize,
    /// Events still queued for the next attempt.
    pub pending: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any session the user already had.
    pub async fn insert(&self, user_id: i64, session: TrainingSession) {
        self.inner.lock().await.sessions.insert(user_id, session);
    }

    /// Drop the user's session and anything still queued for them.
    pub async fn remove(&self, user_id: i64) -> Option<TrainingSession> {
        let mut inner = self.inner.lock().await;
        inner.pending.remove(&user_id);
        inner.sessions.remove(&user_id)
    }

    /// Run `f` against the user's session while holding the lock.
    pub async fn with_session<T>(
        &self,
        user_id: i64,
        f: impl FnOnce(&mut TrainingSession) -> T,
    ) -> Option<T> {
        let mut inner = self.inner.lock().await;
        inner.sessions.get_mut(&user_id).map(f)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn queue_completions(&self, user_id: i64, events: Vec<ExerciseCompleted>) {
        if events.is_empty() {
            return;
        }
        self.inner
            .lock()
            .await
            .pending
            .entry(user_id)
            .or_default()
            .extend(events);
    }

    pub async fn pending(&self, user_id: i64) -> Vec<ExerciseCompleted> {
        self.inner
            .lock()
            .await
            .pending
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Hand every queued completion to `persist`, outside the lock.
    ///
    /// A failure does not stop the remaining events; failed ones go back on
    /// the queue ahead of anything queued meanwhile.
    pub async fn flush_completions<F, Fut, E>(&self, user_id: i64, mut persist: F) -> FlushReport
    where
        F: FnMut(ExerciseCompleted) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let queued = self
            .inner
            .lock()
            .await
            .pending
            .remove(&user_id)
            .unwrap_or_default();

        let mut persisted = 0;
        let mut failed = Vec::new();
        for event in queued {
            match persist(event.clone()).await {
                Ok(()) => persisted += 1,
                Err(e) => {
                    tracing::warn!(
                        user_id,
                        lesson_id = %event.lesson_id,
                        exercise_id = %event.exercise_id,
                        "Completion not saved, will retry: {e}"
                    );
                    failed.push(event);
                }
            }
        }

        let mut inner = self.inner.lock().await;
        let pending = if failed.is_empty() {
            inner.pending.get(&user_id).map_or(0, Vec::len)
        } else {
            let queue = inner.pending.entry(user_id).or_default();
            failed.append(queue);
            *queue = failed;
            queue.len()
        };

        FlushReport { persisted, pending }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lesson_core::{Exercise, Lesson, Ply, RecordingTracker, STANDARD_START_FEN};

    fn lesson() -> Arc<Lesson> {
        Arc::new(Lesson {
            lesson_id: "lesson-test".into(),
            title: "Test".into(),
            description: None,
            cover_fen: None,
            exercises: vec![Exercise {
                id: "only".into(),
                fen: STANDARD_START_FEN.into(),
                label: "Only".into(),
                script: vec![Ply::user("e2e4")],
                success_message: "Done".into(),
            }],
        })
    }

    fn event(exercise_id: &str) -> ExerciseCompleted {
        ExerciseCompleted {
            lesson_id: "lesson-test".into(),
            exercise_id: exercise_id.into(),
            exercise_index: 0,
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let store = SessionStore::new();
        store.insert(1, TrainingSession::open(lesson()).unwrap()).await;
        store.insert(2, TrainingSession::open(lesson()).unwrap()).await;

        let mut tracker = RecordingTracker::new();
        let outcome = store
            .with_session(1, |s| s.submit_move("e2e4", &mut tracker))
            .await
            .unwrap();
        assert!(outcome.completed());
        assert_eq!(tracker.events().len(), 1);

        let other_ply = store.with_session(2, |s| s.state().ply_index).await;
        assert_eq!(other_ply, Some(0));
        assert!(store.with_session(3, |s| s.state().ply_index).await.is_none());
    }

    #[tokio::test]
    async fn test_insert_replaces_and_remove() {
        let store = SessionStore::new();
        store.insert(1, TrainingSession::open(lesson()).unwrap()).await;
        store.insert(1, TrainingSession::open(lesson()).unwrap()).await;
        store.queue_completions(1, vec![event("only")]).await;
        assert_eq!(store.len().await, 1);
        assert!(store.remove(1).await.is_some());
        assert_eq!(store.len().await, 0);
        assert!(store.pending(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_completion_survives_failed_save() {
        let store = SessionStore::new();
        store.insert(1, TrainingSession::open(lesson()).unwrap()).await;

        let mut tracker = RecordingTracker::new();
        store
            .with_session(1, |s| s.submit_move("e2e4", &mut tracker))
            .await
            .unwrap();
        store.queue_completions(1, tracker.drain()).await;

        let report = store
            .flush_completions(1, |_| async { Err::<(), _>("connection reset") })
            .await;
        assert_eq!(report, FlushReport { persisted: 0, pending: 1 });

        // The session is finished, so replaying the move creates nothing new.
        let again = store
            .with_session(1, |s| s.submit_move("e2e4", &mut tracker))
            .await
            .unwrap();
        assert!(!again.is_ok());
        assert!(tracker.events().is_empty());

        let mut saved = Vec::new();
        let report = store
            .flush_completions(1, |e| {
                saved.push(e);
                async { Ok::<(), &str>(()) }
            })
            .await;
        assert_eq!(report, FlushReport { persisted: 1, pending: 0 });
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].exercise_id, "only");
    }

    #[tokio::test]
    async fn test_one_failure_does_not_drop_the_rest() {
        let store = SessionStore::new();
        store
            .queue_completions(1, vec![event("first"), event("second"), event("third")])
            .await;

        let report = store
            .flush_completions(1, |e| async move {
                if e.exercise_id == "second" {
                    Err("deadlock detected")
                } else {
                    Ok(())
                }
            })
            .await;
        assert_eq!(report, FlushReport { persisted: 2, pending: 1 });

        store.queue_completions(1, vec![event("fourth")]).await;
        let ids: Vec<String> = store
            .pending(1)
            .await
            .into_iter()
            .map(|e| e.exercise_id)
            .collect();
        assert_eq!(ids, vec!["second", "fourth"]);
    }
}
