use std::fmt;

/// Lifecycle state of a member cluster handle.
/// Variants are ordered so that `code > StatusCode::Stopped` means "running".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StatusCode {
    /// cannot be started until enabled again
    Disabled,
    #[default]
    Stopped,
    /// sync task launched
    Started,
    /// waiting for the watch cache to complete its initial sync
    Waiting,
    Ready,
}

impl StatusCode {
    pub fn is_running(&self) -> bool {
        *self > Self::Stopped
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Self::Disabled => "disabled",
            Self::Stopped => "stopped",
            Self::Started => "started",
            Self::Waiting => "waiting",
            Self::Ready => "ready",
        };
        write!(f, "{label}")
    }
}
