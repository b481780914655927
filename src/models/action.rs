//! Moderator action tokens carried by menu buttons.

const EDIT_LOCATION: &str = "edit_location";
const EDIT_DATE: &str = "edit_date";
const DELETE_PHOTO: &str = "delete_photo";
const DELETE_PHOTO_PREFIX: &str = "delete_photo_";
const CANCEL_DELETE_PHOTO: &str = "cancel_delete_photo";
const VALIDATE: &str = "validate";
const REJECT: &str = "reject";

/// Decoded moderator button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeratorAction {
    /// Ask for a replacement location.
    EditLocation,
    /// Ask for a replacement date.
    EditDate,
    /// Show the per-photo delete menu.
    ChooseDeletePhoto,
    /// Remove the photo at a zero-based index; `None` when the suffix is not a number.
    DeletePhoto(Option<usize>),
    /// Close the delete menu without changes.
    CancelDeletePhoto,
    /// Approve and publish.
    Validate,
    /// Discard the submission.
    Reject,
    /// Token not produced by any menu.
    Unknown(String),
}

impl ModeratorAction {
    /// Decode an action token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            EDIT_LOCATION => Self::EditLocation,
            EDIT_DATE => Self::EditDate,
            DELETE_PHOTO => Self::ChooseDeletePhoto,
            CANCEL_DELETE_PHOTO => Self::CancelDeletePhoto,
            VALIDATE => Self::Validate,
            REJECT => Self::Reject,
            other => match other.strip_prefix(DELETE_PHOTO_PREFIX) {
                Some(index) => Self::DeletePhoto(index.parse().ok()),
                None => Self::Unknown(other.to_owned()),
            },
        }
    }

    /// Encode the action as the token sent with a button.
    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::EditLocation => EDIT_LOCATION.to_owned(),
            Self::EditDate => EDIT_DATE.to_owned(),
            Self::ChooseDeletePhoto => DELETE_PHOTO.to_owned(),
            Self::DeletePhoto(Some(index)) => format!("{DELETE_PHOTO_PREFIX}{index}"),
            Self::DeletePhoto(None) => format!("{DELETE_PHOTO_PREFIX}invalid"),
            Self::CancelDeletePhoto => CANCEL_DELETE_PHOTO.to_owned(),
            Self::Validate => VALIDATE.to_owned(),
            Self::Reject => REJECT.to_owned(),
            Self::Unknown(token) => token.clone(),
        }
    }
}
