//! Per-sender intake session model.

use serde::{Deserialize, Serialize};

use crate::config::IntakeConfig;
use crate::workflow::dedup::RecentMessageIds;

/// Stage of the intake conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    /// Waiting for the trigger word.
    #[default]
    Idle,
    /// Waiting for the place name.
    AwaitingLocation,
    /// Waiting for a `DD/MM/YYYY` date.
    AwaitingDate,
    /// Collecting photos until the finish keyword.
    AwaitingPhotos,
    /// Submission handed off; the session is about to be reset.
    Done,
}

/// Conversational state of one end user.
#[derive(Debug, Clone)]
pub struct SenderSession {
    /// Platform-scoped sender identifier.
    pub sender_id: String,
    /// Current stage.
    pub step: IntakeStep,
    /// Place name, set once per cycle.
    pub location: Option<String>,
    /// Validated date, set once per cycle.
    pub date: Option<String>,
    /// Image URLs in upload order.
    pub photos: Vec<String>,
    /// Set when the finish keyword closed the cycle.
    pub finished: bool,
    /// The "send the place" instruction went out during this step.
    pub location_prompt_sent: bool,
    /// The "send the date" instruction went out during this step.
    pub date_prompt_sent: bool,
    /// The invalid-date error went out during this step.
    pub date_error_sent: bool,
    /// The "send photos or finish" reminder went out since the last photo.
    pub photo_prompt_sent: bool,
    /// Recently processed inbound message IDs.
    pub seen: RecentMessageIds,
}

impl SenderSession {
    /// Fresh session at the idle step.
    #[must_use]
    pub fn new(sender_id: impl Into<String>, intake: &IntakeConfig) -> Self {
        Self {
            sender_id: sender_id.into(),
            step: IntakeStep::Idle,
            location: None,
            date: None,
            photos: Vec::new(),
            finished: false,
            location_prompt_sent: false,
            date_prompt_sent: false,
            date_error_sent: false,
            photo_prompt_sent: false,
            seen: RecentMessageIds::new(intake.dedup_capacity, intake.dedup_retain),
        }
    }

    /// Replace this session with a fresh record, dropping the processed-ID history.
    pub fn reset(&mut self) {
        let (capacity, retain) = self.seen.limits();
        let fresh = Self {
            seen: RecentMessageIds::new(capacity, retain),
            ..Self::new(std::mem::take(&mut self.sender_id), &IntakeConfig::default())
        };
        *self = fresh;
    }
}
