//! Pending find-only runs awaiting confirmation.

use crate::directive::Directive;
use crate::document::DocumentId;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("handshake for {0} is stale")]
    StaleHandshake(DocumentId),

    #[error("no find-only run is pending for {0}")]
    NoPendingRun(DocumentId),
}

/// Token binding a find-only result to one document state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Handshake {
    pub document: DocumentId,
    /// Bumped on every find-only run, so only the latest token is live.
    pub generation: u64,
    /// Text hash when the targets were found.
    pub fingerprint: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub handshake: Handshake,
    pub directive: Directive,
}

/// At most one pending session per document.
#[derive(Debug, Default)]
pub(crate) struct Sessions {
    live: HashMap<DocumentId, Session>,
    generation: u64,
}

impl Sessions {
    /// Store a session, replacing any pending one for the same document.
    pub fn begin(&mut self, document: DocumentId, fingerprint: u64, directive: Directive) -> Handshake {
        self.generation += 1;
        let handshake = Handshake {
            document,
            generation: self.generation,
            fingerprint,
        };
        self.live.insert(
            document,
            Session {
                handshake,
                directive,
            },
        );
        handshake
    }

    pub fn take(&mut self, document: DocumentId) -> Option<Session> {
        self.live.remove(&document)
    }

    pub fn forget(&mut self, document: DocumentId) {
        self.live.remove(&document);
    }

    /// Drop the session `handshake` was issued for, if it is still the live one.
    pub fn discard(&mut self, handshake: &Handshake) {
        if self.pending(handshake.document) == Some(handshake) {
            self.live.remove(&handshake.document);
        }
    }

    pub fn pending(&self, document: DocumentId) -> Option<&Handshake> {
        self.live.get(&document).map(|session| &session.handshake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_new_session_supersedes_the_old_one() {
        let mut sessions = Sessions::default();
        let doc = DocumentId::next();
        let first = sessions.begin(doc, 1, Directive::new(["a"]));
        let second = sessions.begin(doc, 1, Directive::new(["b"]));
        assert_ne!(first, second);
        assert_eq!(sessions.pending(doc), Some(&second));

        let session = sessions.take(doc).unwrap();
        assert_eq!(session.directive.patterns, vec!["b"]);
        assert!(sessions.take(doc).is_none());
    }

    #[test]
    fn sessions_are_per_document() {
        let mut sessions = Sessions::default();
        let a = DocumentId::next();
        let b = DocumentId::next();
        sessions.begin(a, 1, Directive::default());
        sessions.begin(b, 2, Directive::default());
        sessions.forget(a);
        assert!(sessions.pending(a).is_none());
        assert!(sessions.pending(b).is_some());
    }

    #[test]
    fn discard_only_drops_the_live_token() {
        let mut sessions = Sessions::default();
        let doc = DocumentId::next();
        let old = sessions.begin(doc, 1, Directive::default());
        let live = sessions.begin(doc, 1, Directive::default());

        sessions.discard(&old);
        assert_eq!(sessions.pending(doc), Some(&live));
        sessions.discard(&live);
        assert!(sessions.pending(doc).is_none());
    }
}
