//! Domain model module declarations.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod action;
pub mod event;
pub mod menu;
pub mod session;
pub mod submission;

/// Identifier of a message posted in the moderator chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
