//! Challenge response authentication.
//!
//! ```text
//! client                                  server
//!   | BeginSessionRequest { user }          |
//!   |-------------------------------------->|
//!   |  BeginSessionResponse { challenge }   |
//!   |<--------------------------------------|
//!   | ClientAuthenticationRequest { sig }   |   sig = RSA PKCS#1 v1.5 (SHA-512 (challenge))
//!   |-------------------------------------->|
//!   |  ClientAuthenticationResponse { id }  |
//!   |<--------------------------------------|
//! ```
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha512};
use std::{
    fmt,
    io::{Read, Write},
};

use crate::{
    Result,
    common::{debug, span, verbose},
    connection::Connection,
    protocol::{
        BeginSessionRequest, BeginSessionResponse, ClientAuthenticationRequest,
        ClientAuthenticationResponse, StatusMessage,
    },
};

mod key;

pub use key::{KeyError, PrivateKey};

/// Handshake step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// Session request sent, waiting for the challenge.
    SessionRequested,
    /// Signed challenge sent, waiting for the verdict.
    Authenticating,
}

/// Sign `challenge` as the server expects it.
///
/// PKCS#1 v1.5 signatures are deterministic, the same key and challenge always give the same
/// signature.
pub fn sign_challenge(key: &PrivateKey, challenge: &[u8]) -> Result<Vec<u8>, AuthError> {
    let digest = Sha512::digest(challenge);
    key.as_rsa()
        .sign(Pkcs1v15Sign::new::<Sha512>(), &digest)
        .map_err(AuthError::Sign)
}

impl<S: Read + Write> Connection<S> {
    /// Run the handshake, storing the session id on success.
    pub(crate) fn authenticate(&mut self, user: &str, key: &PrivateKey) -> Result<()> {
        span!("authenticate", user);
        let mut state = AuthState::Unauthenticated;

        match self.exchange(user, key, &mut state) {
            Ok(session_id) => {
                debug!(self.trace, "user {user:?} authenticated, session {session_id}");
                self.session_id = session_id;
                Ok(())
            }
            Err(err) => {
                verbose!(?state, "authentication failed");
                debug!(self.trace, "authentication of {user:?} failed: {err}");
                self.poisoned = true;
                Err(err)
            }
        }
    }

    fn exchange(&mut self, user: &str, key: &PrivateKey, state: &mut AuthState) -> Result<String> {
        self.send(&BeginSessionRequest { user_name: user.into() })?;
        *state = AuthState::SessionRequested;

        let begin: BeginSessionResponse = self.recv()?;
        if !begin.session_started {
            return Err(AuthError::SessionRejected(begin.message).into());
        }

        let signature = sign_challenge(key, &begin.challenge)?;
        self.send(&ClientAuthenticationRequest { signature })?;
        *state = AuthState::Authenticating;

        let auth: ClientAuthenticationResponse = self.recv()?;
        if !auth.authenticated {
            return Err(AuthError::Rejected(auth.message).into());
        }

        verbose!(session_id = %auth.session_id, "authenticated");
        Ok(auth.session_id)
    }
}

/// An error when the server refuse the handshake.
pub enum AuthError {
    /// Server did not start the session.
    SessionRejected(Option<StatusMessage>),
    /// Server rejected the signed challenge.
    Rejected(Option<StatusMessage>),
    /// Challenge could not be signed with the key.
    Sign(rsa::Error),
}

impl AuthError {
    /// Returns the handshake step that failed.
    pub fn state(&self) -> AuthState {
        match self {
            Self::SessionRejected(_) | Self::Sign(_) => AuthState::SessionRequested,
            Self::Rejected(_) => AuthState::Authenticating,
        }
    }

    /// Returns the server status message, if any.
    pub fn status(&self) -> Option<&StatusMessage> {
        match self {
            Self::SessionRejected(m) | Self::Rejected(m) => m.as_ref(),
            Self::Sign(_) => None,
        }
    }
}

impl std::error::Error for AuthError { }

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionRejected(_) => f.write_str("Starting session failed")?,
            Self::Rejected(_) => f.write_str("Authentication failed")?,
            Self::Sign(e) => return write!(f, "Signing challenge failed: {e}"),
        }
        match self.status() {
            Some(m) => write!(f, ": {} (code {})", m.text, m.status_code),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deterministic_signature() {
        let key = PrivateKey::from_pem(include_bytes!("../../tests/fixtures/id_rsa.pem"), None).unwrap();
        let reference = include_str!("../../tests/fixtures/signature.hex");
        let challenge = b"siodb challenge 0123456789abcdef";

        let first = sign_challenge(&key, challenge).unwrap();
        let second = sign_challenge(&key, challenge).unwrap();
        assert_eq!(first, second);
        assert_eq!(hex::encode(first), reference.trim());
    }

    #[test]
    fn error_message() {
        let err = AuthError::Rejected(Some(StatusMessage { status_code: 5, text: "bad key".into() }));
        assert_eq!(err.to_string(), "Authentication failed: bad key (code 5)");
        assert_eq!(err.state(), AuthState::Authenticating);

        let err = AuthError::SessionRejected(None);
        assert_eq!(err.to_string(), "Starting session failed");
        assert_eq!(err.state(), AuthState::SessionRequested);
    }
}
