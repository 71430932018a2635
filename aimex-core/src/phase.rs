/// Top-level states of one aiming session.
///
/// `Aiming` runs crossing detection and path recording, `ResultDisplay`
/// holds the ghost target and crossing point on screen for the configured
/// pause, `Ended` is terminal until an external reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Aiming,
    ResultDisplay,
    Ended,
}

impl SessionPhase {
    pub fn is_aiming(&self) -> bool {
        matches!(self, Self::Aiming)
    }

    pub fn is_result_display(&self) -> bool {
        matches!(self, Self::ResultDisplay)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }
}
