//! Caller identity and the permission checks used by the fact services.
//!
//! A [`SecurityContext`] is passed explicitly into every workflow call; there
//! is no ambient "current user" lookup.

use std::{future::Future, sync::Arc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  fact::{AccessMode, FactEntity},
  store::FactStore,
};

// ─── Functions and grants ────────────────────────────────────────────────────

/// A named capability a user may hold for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
  /// Read facts and the objects they are bound to.
  ViewFactObjects,
  /// Record new facts (including retractions).
  AddFactObjects,
}

impl Function {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ViewFactObjects => "view_fact_objects",
      Self::AddFactObjects => "add_fact_objects",
    }
  }
}

/// The functions a user holds within one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
  pub organization_id: Uuid,
  pub functions:       Vec<Function>,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id:         Uuid,
  /// The organization facts are attributed to when a request names none.
  pub organization_id: Uuid,
  #[serde(default)]
  pub grants:          Vec<Grant>,
}

impl Session {
  pub fn has_permission(&self, function: Function, organization_id: Uuid) -> bool {
    self
      .grants
      .iter()
      .any(|g| g.organization_id == organization_id && g.functions.contains(&function))
  }

  /// Whether `function` is held for at least one organization.
  pub fn has_permission_anywhere(&self, function: Function) -> bool {
    self.grants.iter().any(|g| g.functions.contains(&function))
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

pub trait SecurityContext: Send + Sync {
  /// Id of the authenticated user, or [`Error::AuthenticationFailed`].
  fn current_user_id(&self) -> Result<Uuid>;

  /// Home organization of the authenticated user.
  fn current_user_organization_id(&self) -> Result<Uuid>;

  /// Require `function` for `organization_id`.
  fn check_permission(&self, function: Function, organization_id: Uuid) -> Result<()>;

  /// Require read access to `fact`, according to its access mode.
  fn check_read_permission<'a>(
    &'a self,
    fact: &'a FactEntity,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

// ─── Session-backed implementation ───────────────────────────────────────────

/// A [`SecurityContext`] over an optional [`Session`]. ACL membership for
/// `RoleBased` and `Explicit` facts is looked up in the store.
pub struct SessionSecurityContext<S: FactStore> {
  session: Option<Session>,
  store:   Arc<S>,
}

impl<S: FactStore> SessionSecurityContext<S> {
  pub fn new(session: Option<Session>, store: Arc<S>) -> Self {
    Self { session, store }
  }

  fn session(&self) -> Result<&Session> {
    self
      .session
      .as_ref()
      .ok_or_else(|| Error::AuthenticationFailed("no authenticated session".into()))
  }

  async fn check_acl_membership(&self, session: &Session, fact: &FactEntity) -> Result<()> {
    let acl = self.store.fetch_fact_acl(fact.id).await.map_err(Error::store)?;
    if acl.iter().any(|entry| entry.subject_id == session.user_id) {
      Ok(())
    } else {
      Err(Error::AccessDenied(format!("no access to fact {}", fact.id)))
    }
  }
}

impl<S: FactStore> SecurityContext for SessionSecurityContext<S> {
  fn current_user_id(&self) -> Result<Uuid> {
    Ok(self.session()?.user_id)
  }

  fn current_user_organization_id(&self) -> Result<Uuid> {
    Ok(self.session()?.organization_id)
  }

  fn check_permission(&self, function: Function, organization_id: Uuid) -> Result<()> {
    if self.session()?.has_permission(function, organization_id) {
      Ok(())
    } else {
      Err(Error::AccessDenied(format!(
        "{} is not granted for organization {organization_id}",
        function.as_str()
      )))
    }
  }

  async fn check_read_permission<'a>(&'a self, fact: &'a FactEntity) -> Result<()> {
    let session = self.session()?;

    match fact.access_mode {
      AccessMode::Public => {
        if session.has_permission_anywhere(Function::ViewFactObjects) {
          Ok(())
        } else {
          Err(Error::AccessDenied(format!("no access to fact {}", fact.id)))
        }
      }
      AccessMode::RoleBased => {
        if session.has_permission(Function::ViewFactObjects, fact.organization_id) {
          return Ok(());
        }
        self.check_acl_membership(session, fact).await
      }
      AccessMode::Explicit => self.check_acl_membership(session, fact).await,
    }
  }
}
