//! Shared application state handed to every delivery adapter.

use std::sync::Arc;

use crate::channels::{
    Clock, FeedPublisher, IdGenerator, ModeratorChannel, SystemClock, UserChannel, UuidGenerator,
};
use crate::config::GlobalConfig;
use crate::workflow::store::{SessionStore, SubmissionStore};

/// Process-wide state: configuration, volatile tables and collaborators.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Intake sessions keyed by end-user identifier.
    pub sessions: SessionStore,
    /// Submissions under review.
    pub submissions: SubmissionStore,
    /// End-user platform.
    pub users: Arc<dyn UserChannel>,
    /// Moderator platform.
    pub moderator: Arc<dyn ModeratorChannel>,
    /// Public feed.
    pub publisher: Arc<dyn FeedPublisher>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Submission id source.
    pub ids: Arc<dyn IdGenerator>,
}

impl AppState {
    /// State with empty tables, the wall clock and UUID identifiers.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        users: Arc<dyn UserChannel>,
        moderator: Arc<dyn ModeratorChannel>,
        publisher: Arc<dyn FeedPublisher>,
    ) -> Self {
        Self {
            config,
            sessions: SessionStore::new(),
            submissions: SubmissionStore::new(),
            users,
            moderator,
            publisher,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the identifier source.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }
}
