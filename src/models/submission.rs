//! Pending submission model reviewed by the moderator.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical identifier of a submission, stable across re-announcements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl Display for SubmissionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review lifecycle of a submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    /// Waiting for a moderator decision.
    Awaiting,
    /// The next reply supplies a new location.
    EditingLocation,
    /// The next reply supplies a new date.
    EditingDate,
    /// Validated or rejected; terminal.
    Done,
}

impl SubmissionState {
    /// Whether the submission is waiting for a free-text reply.
    #[must_use]
    pub fn is_editing(self) -> bool {
        matches!(self, Self::EditingLocation | Self::EditingDate)
    }
}

/// Everything the intake conversation collected, handed to the announcer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDraft {
    /// Image URLs in upload order.
    pub photos: Vec<String>,
    /// Place name.
    pub location: String,
    /// `DD/MM/YYYY` date.
    pub date: String,
    /// Sender display name.
    pub sender_name: String,
    /// Sender identifier on the end-user platform.
    pub sender_id: String,
}

/// A submission awaiting moderation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    /// Canonical identifier.
    pub id: SubmissionId,
    /// Image URLs; entries may be removed by the moderator.
    pub photos: Vec<String>,
    /// Place name, editable.
    pub location: String,
    /// `DD/MM/YYYY` date, editable.
    pub date: String,
    /// Sender display name.
    pub sender_name: String,
    /// Sender identifier on the end-user platform.
    pub sender_id: String,
    /// Review state.
    pub state: SubmissionState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last state or content change.
    pub updated_at: DateTime<Utc>,
}

impl PendingSubmission {
    /// Construct a new awaiting submission from an intake draft.
    #[must_use]
    pub fn new(id: SubmissionId, draft: SubmissionDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            photos: draft.photos,
            location: draft.location,
            date: draft.date,
            sender_name: draft.sender_name,
            sender_id: draft.sender_id,
            state: SubmissionState::Awaiting,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `state`, stamping the change time.
    pub fn transition(&mut self, state: SubmissionState, now: DateTime<Utc>) {
        self.state = state;
        self.updated_at = now;
    }

    /// Whether a decision has been made.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == SubmissionState::Done
    }
}
