use std::fmt;

/// Lifecycle state of a [`ManagedDestination`](super::ManagedDestination).
///
/// | From | Operation | To |
/// |------|-----------|----|
/// | Uninitialized | init | Initialized |
/// | Initialized, Closed | open | Opened |
/// | Opened | send, flush | Opened |
/// | Initialized, Opened, Closed | close | Closed |
/// | any | deinit | Deinitialized |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationState {
    /// Constructed; options declared but not validated.
    Uninitialized,
    /// Options validated and the plugin initialized.
    Initialized,
    /// Ready to accept messages.
    Opened,
    /// Closed; may be reopened or deinitialized.
    Closed,
    /// Terminal. All resources released.
    Deinitialized,
}

impl DestinationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Deinitialized => "deinitialized",
        }
    }

    /// The state `operation` leads to on success, or `None` if the operation
    /// is not allowed in this state.
    ///
    /// `close` on a closed destination and `deinit` on a deinitialized one are
    /// accepted no-ops. `deinit` from [`Opened`](Self::Opened) is accepted;
    /// the caller closes first.
    pub fn transition(self, operation: Operation) -> Option<Self> {
        use DestinationState::*;
        use Operation::*;

        match (self, operation) {
            (Uninitialized, Init) => Some(Initialized),
            (Initialized | Closed, Open) => Some(Opened),
            (Opened, Send | Flush) => Some(Opened),
            (Initialized | Opened | Closed, Close) => Some(Closed),
            (Uninitialized | Initialized | Opened | Closed | Deinitialized, Deinit) => {
                Some(Deinitialized)
            }
            _ => None,
        }
    }
}

impl fmt::Display for DestinationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle operation driven by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Open,
    Send,
    Flush,
    Close,
    Deinit,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Open => "open",
            Self::Send => "send",
            Self::Flush => "flush",
            Self::Close => "close",
            Self::Deinit => "deinit",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = DestinationState::Uninitialized;
        for op in [
            Operation::Init,
            Operation::Open,
            Operation::Send,
            Operation::Flush,
            Operation::Close,
            Operation::Deinit,
        ] {
            state = state.transition(op).unwrap();
        }
        assert_eq!(state, DestinationState::Deinitialized);
    }

    #[test]
    fn test_rejected_transitions() {
        use DestinationState::*;
        use Operation::*;

        assert_eq!(Uninitialized.transition(Open), None);
        assert_eq!(Uninitialized.transition(Send), None);
        assert_eq!(Uninitialized.transition(Close), None);
        assert_eq!(Initialized.transition(Init), None);
        assert_eq!(Initialized.transition(Send), None);
        assert_eq!(Opened.transition(Open), None);
        assert_eq!(Closed.transition(Flush), None);
        assert_eq!(Deinitialized.transition(Init), None);
        assert_eq!(Deinitialized.transition(Open), None);
    }

    #[test]
    fn test_reopen_and_idempotent_teardown() {
        use DestinationState::*;
        use Operation::*;

        assert_eq!(Closed.transition(Open), Some(Opened));
        assert_eq!(Closed.transition(Close), Some(Closed));
        assert_eq!(Deinitialized.transition(Deinit), Some(Deinitialized));
    }

    #[test]
    fn test_display() {
        assert_eq!(DestinationState::Opened.to_string(), "opened");
        assert_eq!(Operation::Flush.to_string(), "flush");
    }
}
