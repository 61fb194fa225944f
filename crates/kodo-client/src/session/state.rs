/// World-server protocol state, advanced by local calls and decoded frames.
///
/// The progression is linear; the only way back is `Failed` or
/// `Disconnected`. A frame arriving in a state that does not expect it is
/// logged and dropped, never an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No transport. Initial state, also reached by `disconnect`.
    Disconnected,
    /// Transport dial in progress.
    Connecting,
    /// Transport up, waiting for the server's auth challenge.
    Connected,
    /// Challenge decoded, server seed captured.
    ChallengeReceived,
    /// Auth session frame sent, header cipher armed, awaiting verdict.
    AuthSent,
    /// Server accepted the session proof.
    Authenticated,
    /// Ready for character enumeration.
    Ready,
    /// Enumeration request sent, waiting for the roster.
    CharListRequested,
    /// Roster received, a character can be selected.
    CharListReceived,
    /// Player login sent, waiting for world-entry confirmation.
    EnteringWorld,
    /// Steady state: world updates, chat, movement, heartbeat.
    InWorld,
    /// Terminal. Reached from any state on transport loss or auth rejection.
    Failed,
}

impl SessionState {
    /// States in which the session holds a live transport.
    pub fn is_online(&self) -> bool {
        !matches!(
            self,
            SessionState::Disconnected | SessionState::Connecting | SessionState::Failed
        )
    }
}
