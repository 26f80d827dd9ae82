//! Error classification
//!
//! An HTTP status only means "revoked credential" in the context of a given
//! endpoint: 400 from the token endpoint says the refresh token is dead, 403
//! from an authenticated read says the access token is. Each endpoint carries
//! a [`StatusTable`] and every outcome is run through the same
//! [`StatusTable::classify`].

use crate::error::Error;

/// Per-endpoint mapping from error statuses to taxonomy kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    revoked: Vec<u16>,
}

impl StatusTable {
    /// No remapping; every non-200 status stays a server error
    pub fn plain() -> Self {
        Self::default()
    }

    /// Token refresh endpoint: 400 means the refresh token is revoked
    pub fn token_refresh() -> Self {
        Self::plain().revoked_on(400)
    }

    /// Endpoints that require a valid access token: 403 means revoked
    pub fn authenticated() -> Self {
        Self::plain().revoked_on(403)
    }

    /// Treat `status` as a revoked credential
    #[must_use]
    pub fn revoked_on(mut self, status: u16) -> Self {
        if !self.revoked.contains(&status) {
            self.revoked.push(status);
        }
        self
    }

    /// Map an outcome into the taxonomy for this endpoint
    pub fn classify(&self, err: Error) -> Error {
        match err {
            Error::ServerError { status } if self.revoked.contains(&status) => Error::OauthRevoked,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use test_case::test_case;

    #[test_case(StatusTable::token_refresh(), 400, ErrorKind::OauthRevoked ; "refresh 400 is revoked")]
    #[test_case(StatusTable::token_refresh(), 403, ErrorKind::ServerError ; "refresh 403 is server error")]
    #[test_case(StatusTable::authenticated(), 403, ErrorKind::OauthRevoked ; "authenticated 403 is revoked")]
    #[test_case(StatusTable::authenticated(), 400, ErrorKind::ServerError ; "authenticated 400 is server error")]
    #[test_case(StatusTable::plain(), 403, ErrorKind::ServerError ; "plain 403 is server error")]
    #[test_case(StatusTable::plain(), 500, ErrorKind::ServerError ; "plain 500 is server error")]
    fn test_classify_status(table: StatusTable, status: u16, expected: ErrorKind) {
        assert_eq!(table.classify(Error::server(status)).kind(), expected);
    }

    #[test]
    fn test_server_error_keeps_status() {
        let err = StatusTable::authenticated().classify(Error::server(400));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_non_status_errors_pass_through() {
        let table = StatusTable::token_refresh();
        assert!(matches!(table.classify(Error::Timeout), Error::Timeout));
        assert!(matches!(
            table.classify(Error::parse("bad")),
            Error::Parse { .. }
        ));
    }

    #[test]
    fn test_revoked_on_is_idempotent() {
        let table = StatusTable::plain().revoked_on(401).revoked_on(401);
        assert_eq!(table, StatusTable::plain().revoked_on(401));
    }
}
