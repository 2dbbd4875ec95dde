use std::time::SystemTime;

/// How a transfer ended when it did not fail.
///
/// Both variants carry the validators to remember for the next conditional
/// request. For [`TransferOutcome::NotModified`] these are the validators the
/// request was made with, and the destination was never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Downloaded {
        etag: Option<String>,
        last_modified: Option<SystemTime>,
    },
    NotModified {
        etag: Option<String>,
        last_modified: Option<SystemTime>,
    },
}

impl TransferOutcome {
    pub fn etag(&self) -> Option<&str> {
        match self {
            TransferOutcome::Downloaded { etag, .. }
            | TransferOutcome::NotModified { etag, .. } => etag.as_deref(),
        }
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        match self {
            TransferOutcome::Downloaded { last_modified, .. }
            | TransferOutcome::NotModified { last_modified, .. } => *last_modified,
        }
    }

    pub fn is_not_modified(&self) -> bool {
        matches!(self, TransferOutcome::NotModified { .. })
    }
}
