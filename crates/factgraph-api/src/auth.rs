//! HTTP Basic authentication resolving to a [`Session`].
//!
//! Authentication never rejects a request by itself: a missing or wrong
//! credential simply yields no session, and the service being called reports
//! `AuthenticationFailed` when it needs a caller.

use std::convert::Infallible;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use factgraph_core::{
  index::FactIndex,
  security::{Grant, Session},
  store::FactStore,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::AppState;

/// A configured API user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
  pub username:        String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash:   String,
  pub user_id:         Uuid,
  pub organization_id: Uuid,
  #[serde(default)]
  pub grants:          Vec<Grant>,
}

impl UserAccount {
  fn session(&self) -> Session {
    Session {
      user_id:         self.user_id,
      organization_id: self.organization_id,
      grants:          self.grants.clone(),
    }
  }
}

/// The set of users allowed to call the API.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
  users: Vec<UserAccount>,
}

impl UserDirectory {
  pub fn new(users: Vec<UserAccount>) -> Self {
    Self { users }
  }

  /// Resolve the session for the Basic credentials in `headers`, if valid.
  pub fn authenticate(&self, headers: &HeaderMap) -> Option<Session> {
    let (username, password) = basic_credentials(headers)?;

    let Some(account) = self.users.iter().find(|u| u.username == username) else {
      debug!(%username, "unknown user");
      return None;
    };

    let parsed_hash = PasswordHash::new(&account.password_hash).ok()?;
    if Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .is_err()
    {
      debug!(%username, "wrong password");
      return None;
    }

    Some(account.session())
  }
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let header_val = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let encoded = header_val.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (username, password) = creds.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

/// The session of the caller, or `None` for anonymous requests.
pub struct MaybeSession(pub Option<Session>);

impl<S> FromRequestParts<AppState<S>> for MaybeSession
where
  S: FactStore + FactIndex + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeSession(state.users.authenticate(&parts.headers)))
  }
}
