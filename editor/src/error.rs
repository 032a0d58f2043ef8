use screenplay::cursor::Selection;

/// Why a document host refused a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("document has been destroyed")]
    Destroyed,
    #[error("selection {0:?} points outside the document")]
    InvalidSelection(Selection),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key '{0}' (expected 'enter' or 'tab')")]
pub struct UnknownKey(pub String);
