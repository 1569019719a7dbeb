// 🎫 Session - per-user interaction state
//
// Replaces a process-wide "registered" flag. Whoever drives the
// interaction owns a Session and passes it to the workflow and catalog.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    registered_identifier: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful registration in this session
    pub fn mark_registered(&mut self, identifier: impl Into<String>) {
        self.registered_identifier = Some(identifier.into());
    }

    pub fn has_registration(&self) -> bool {
        self.registered_identifier.is_some()
    }

    /// Identifier of the most recent successful registration
    pub fn registered_identifier(&self) -> Option<&str> {
        self.registered_identifier.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_has_no_registration() {
        let session = Session::new();
        assert!(!session.has_registration());
        assert_eq!(session.registered_identifier(), None);
    }

    #[test]
    fn test_mark_registered_keeps_latest() {
        let mut session = Session::new();
        session.mark_registered("11111111111");
        session.mark_registered("22222222222");
        assert!(session.has_registration());
        assert_eq!(session.registered_identifier(), Some("22222222222"));
    }
}
