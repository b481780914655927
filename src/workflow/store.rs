//! In-memory session and submission tables.
//!
//! Both tables guard their map with one mutex and every record with its
//! own, so one sender or one submission is mutated by a single task at a
//! time while unrelated keys proceed independently.
//!
//! Lock order: a record lock may be held while taking a table lock, never
//! the reverse. Table methods that inspect records snapshot the `Arc`s,
//! release the table, and only then lock records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::config::IntakeConfig;
use crate::models::session::SenderSession;
use crate::models::submission::{PendingSubmission, SubmissionId};
use crate::models::MessageId;

/// A session behind its per-sender lock.
pub type SharedSession = Arc<Mutex<SenderSession>>;

/// A submission behind its per-submission lock.
pub type SharedSubmission = Arc<Mutex<PendingSubmission>>;

/// Sender sessions keyed by end-user identifier.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `sender_id`, created at the idle step on first contact.
    pub async fn get_or_create(&self, sender_id: &str, intake: &IntakeConfig) -> SharedSession {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(
            sessions
                .entry(sender_id.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(SenderSession::new(sender_id, intake)))),
        )
    }

    /// Number of known senders.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no sender has made contact yet.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[derive(Debug, Default)]
struct SubmissionTable {
    records: HashMap<SubmissionId, SharedSubmission>,
    by_message: HashMap<MessageId, SubmissionId>,
    messages: HashMap<SubmissionId, Vec<MessageId>>,
    /// Bound messages whose buttons carry photo indexes.
    menus: HashMap<SubmissionId, Vec<MessageId>>,
}

impl SubmissionTable {
    fn bind(&mut self, id: &SubmissionId, message_ids: &[MessageId]) {
        for message_id in message_ids {
            self.by_message.insert(*message_id, id.clone());
        }
        self.messages
            .entry(id.clone())
            .or_default()
            .extend_from_slice(message_ids);
    }

    fn release(&mut self, id: &SubmissionId, message_ids: &[MessageId]) {
        for message_id in message_ids {
            if self.by_message.get(message_id) == Some(id) {
                self.by_message.remove(message_id);
            }
        }
    }

    fn unbind_all(&mut self, id: &SubmissionId) -> usize {
        self.menus.remove(id);
        let previous = self.messages.remove(id).unwrap_or_default();
        self.release(id, &previous);
        previous.len()
    }

    fn unbind_menus(&mut self, id: &SubmissionId) -> usize {
        let menus = self.menus.remove(id).unwrap_or_default();
        self.release(id, &menus);
        if let Some(bound) = self.messages.get_mut(id) {
            bound.retain(|message_id| !menus.contains(message_id));
        }
        menus.len()
    }
}

/// Pending submissions keyed by canonical id, with a reverse index from
/// moderator message id to submission.
#[derive(Debug, Default)]
pub struct SubmissionStore {
    table: Mutex<SubmissionTable>,
}

impl SubmissionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a submission with no message bound to it yet.
    pub async fn insert(&self, submission: PendingSubmission) -> SharedSubmission {
        let id = submission.id.clone();
        let shared = Arc::new(Mutex::new(submission));
        let mut table = self.table.lock().await;
        table.records.insert(id.clone(), Arc::clone(&shared));
        table.messages.entry(id).or_default();
        shared
    }

    /// Bind additional messages, such as edit prompts, to a submission.
    pub async fn bind(&self, id: &SubmissionId, message_ids: &[MessageId]) {
        let mut table = self.table.lock().await;
        if !table.records.contains_key(id) {
            return;
        }
        table.bind(id, message_ids);
    }

    /// Bind a delete-photo menu. It stays valid only until the photo list
    /// changes, see [`Self::unbind_menus`].
    pub async fn bind_menu(&self, id: &SubmissionId, message_id: MessageId) {
        let mut table = self.table.lock().await;
        if !table.records.contains_key(id) {
            return;
        }
        table.bind(id, &[message_id]);
        table.menus.entry(id.clone()).or_default().push(message_id);
    }

    /// Invalidate every delete-photo menu of a submission, leaving its other
    /// bindings in place.
    ///
    /// Returns how many menus were dropped.
    pub async fn unbind_menus(&self, id: &SubmissionId) -> usize {
        self.table.lock().await.unbind_menus(id)
    }

    /// Replace every message bound to a submission with `message_ids`.
    ///
    /// Returns how many earlier bindings were invalidated.
    pub async fn rebind(&self, id: &SubmissionId, message_ids: &[MessageId]) -> usize {
        let mut table = self.table.lock().await;
        if !table.records.contains_key(id) {
            return 0;
        }
        let dropped = table.unbind_all(id);
        table.bind(id, message_ids);
        dropped
    }

    /// Submission a moderator message belongs to.
    pub async fn lookup(&self, message_id: MessageId) -> Option<SharedSubmission> {
        let table = self.table.lock().await;
        let id = table.by_message.get(&message_id)?;
        table.records.get(id).cloned()
    }

    /// Submission by canonical id.
    pub async fn get(&self, id: &SubmissionId) -> Option<SharedSubmission> {
        self.table.lock().await.records.get(id).cloned()
    }

    /// Messages currently bound to a submission.
    pub async fn messages_of(&self, id: &SubmissionId) -> Vec<MessageId> {
        self.table
            .lock()
            .await
            .messages
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Most recently updated submission waiting for an edit reply.
    pub async fn find_editing(&self) -> Option<SharedSubmission> {
        let candidates: Vec<SharedSubmission> =
            self.table.lock().await.records.values().cloned().collect();

        let mut best: Option<(DateTime<Utc>, SharedSubmission)> = None;
        for candidate in candidates {
            let (editing, updated_at) = {
                let submission = candidate.lock().await;
                (submission.state.is_editing(), submission.updated_at)
            };
            if editing && best.as_ref().is_none_or(|(at, _)| updated_at > *at) {
                best = Some((updated_at, candidate));
            }
        }
        best.map(|(_, submission)| submission)
    }

    /// Remove decided submissions last updated before `cutoff`.
    ///
    /// Returns the number of submissions purged.
    pub async fn purge_done(&self, cutoff: DateTime<Utc>) -> usize {
        let candidates: Vec<(SubmissionId, SharedSubmission)> = self
            .table
            .lock()
            .await
            .records
            .iter()
            .map(|(id, record)| (id.clone(), Arc::clone(record)))
            .collect();

        let mut expired = Vec::new();
        for (id, record) in candidates {
            let submission = record.lock().await;
            if submission.is_done() && submission.updated_at < cutoff {
                expired.push(id);
            }
        }

        let mut table = self.table.lock().await;
        for id in &expired {
            table.unbind_all(id);
            table.records.remove(id);
        }
        expired.len()
    }

    /// Number of submissions still waiting for a decision.
    pub async fn pending_count(&self) -> usize {
        let records: Vec<SharedSubmission> =
            self.table.lock().await.records.values().cloned().collect();

        let mut pending = 0;
        for record in records {
            if !record.lock().await.is_done() {
                pending += 1;
            }
        }
        pending
    }

    /// Number of stored submissions, decided ones included.
    pub async fn len(&self) -> usize {
        self.table.lock().await.records.len()
    }

    /// Whether the store holds no submission.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.records.is_empty()
    }
}
