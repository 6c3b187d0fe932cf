/// What a node (or the tree as a whole) produced for one turn.
///
/// `WaitingApproval` and `AuthRequired` carry no payload beyond their
/// variant: the former's detail already lives on the conversation's
/// `pending_approval` (staged by whichever leaf raised it), and the latter's
/// detail is the server/tool pair that needs re-authentication. Every
/// composite node propagates either of these immediately rather than
/// inspecting or altering them — see the node executor's dispatch rules.
#[derive(Debug, Clone)]
pub enum ExecOutcome {
    /// Plain text the node (or its last child) produced.
    Text(String),
    /// A leaf staged an approval; the conversation now holds it.
    WaitingApproval,
    /// A loop-exiting leaf fired; propagates to the nearest loop ancestor
    /// (or all the way to the caller if there is none).
    ExitLoop,
    /// A backend or peer reported that the caller must (re-)authenticate.
    AuthRequired {
        /// The backend or peer name that raised the signal.
        server: String,
        /// The tool or peer delegation that triggered it.
        tool: String,
    },
}

impl ExecOutcome {
    /// Whether this outcome should make an ancestor stop running further
    /// siblings and propagate immediately, per the sequential/loop dispatch
    /// rules.
    #[must_use]
    pub fn propagates_immediately(&self) -> bool {
        !matches!(self, ExecOutcome::Text(_))
    }

    /// The text payload, if this is a `Text` outcome; empty string otherwise.
    ///
    /// Used when a non-text outcome (most commonly `ExitLoop` reaching the
    /// top of the tree with nothing above it to catch it) must still be
    /// rendered as a caller-facing response.
    #[must_use]
    pub fn into_text_or_empty(self) -> String {
        match self {
            ExecOutcome::Text(text) => text,
            _ => String::new(),
        }
    }
}
