/// Values a session can hold, one of each per session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Id of the logged-in account
    UserId,
    /// Random secret the OAuth2 `state` signature is bound to
    StateValidation,
}

impl SessionKey {
    pub(crate) fn prefix(self) -> &'static str {
        match self {
            Self::UserId => "session_user",
            Self::StateValidation => "session_state",
        }
    }
}
