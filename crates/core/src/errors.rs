use thiserror::Error;

use crate::flows::codec::CodecError;
use crate::flows::states::{DialogueStep, FailureReason};

/// Turn-local failures of the dialogue. None of them is fatal to the process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("no catalog item matches the selection at {step}")]
    NotFound { step: DialogueStep },
    #[error("`{value}` is not among the options offered at {step}")]
    InvalidSelection { step: DialogueStep, value: String },
    #[error(transparent)]
    MalformedToken(#[from] CodecError),
}

impl DialogueError {
    /// Malformed tokens restart the dialogue the same way an empty match does.
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::NotFound { .. } | Self::MalformedToken(_) => FailureReason::NotFound,
            Self::InvalidSelection { .. } => FailureReason::InvalidSelection,
        }
    }
}

impl FailureReason {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound => "該当データが見つかりませんでした。最初から選び直してください。",
            Self::InvalidSelection => "選択肢からお選びください。",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::DialogueError;
    use crate::flows::codec::CodecError;
    use crate::flows::states::{DialogueStep, FailureReason};

    #[test]
    fn malformed_token_maps_to_not_found() {
        let error = DialogueError::from(CodecError::EmptyDimensionId);
        assert_eq!(error.reason(), FailureReason::NotFound);
        assert_eq!(
            error.reason().user_message(),
            "該当データが見つかりませんでした。最初から選び直してください。"
        );
    }

    #[test]
    fn invalid_selection_keeps_its_reason() {
        let error = DialogueError::InvalidSelection {
            step: DialogueStep::Class,
            value: "99m".to_owned(),
        };
        assert_eq!(error.reason(), FailureReason::InvalidSelection);
        assert_eq!(error.to_string(), "`99m` is not among the options offered at class");
    }
}
