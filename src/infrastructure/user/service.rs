//! Account lifecycle service
//!
//! Every operation loads fresh records, applies the field access policy and
//! validation, persists, and only then appends its audit entry. An audit
//! failure after a successful persist is reported as
//! [`AccountError::AuditWrite`]; the change itself stays committed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::domain::access::{FieldAccessPolicy, ReadOptions, Requester, Role, WriteOperation};
use crate::domain::audit::{AuditEntry, AuditEvent, AuditLog};
use crate::domain::profile::ProfileValue;
use crate::domain::user::{
    is_blank, LoginDenial, User, UserField, UserRepository, UserStatus, UserUuid,
    ValidationEngine, ValidationErrors, ValidationRule, ADMIN_SCOPE, USER_SCOPE,
};
use crate::domain::AccountError;
use crate::infrastructure::profile::{ProfileData, ProfileDataStore, ProfileView};

use super::password::CredentialHasher;

/// Actor recorded for changes made by the service itself
pub const SYSTEM_ACTOR: &str = "system";

/// Projection returned to callers
pub type Projection = Map<String, Value>;

/// Result of a login attempt; denial is an expected outcome, not an error
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(User),
    Denied(LoginDenial),
}

/// Result of a soft delete; `deleted` reflects whether the closing persist succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
}

/// User account service
#[derive(Debug)]
pub struct UserAccountService<R: UserRepository, H: CredentialHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    profiles: ProfileDataStore,
    audit: Arc<dyn AuditLog>,
    policy: FieldAccessPolicy,
    validator: ValidationEngine,
}

impl<R: UserRepository, H: CredentialHasher> UserAccountService<R, H> {
    pub fn new(
        repository: Arc<R>,
        hasher: Arc<H>,
        profiles: ProfileDataStore,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            repository,
            hasher,
            profiles,
            audit,
            policy: FieldAccessPolicy::new(),
            validator: ValidationEngine::new(),
        }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Load a user record without any access check
    pub async fn find(&self, uuid: &UserUuid) -> Result<Option<User>, AccountError> {
        Ok(self.repository.get(uuid).await?)
    }

    pub async fn count(&self) -> Result<usize, AccountError> {
        Ok(self.repository.count().await?)
    }

    /// Read a user projection; an absent target is `Ok(None)`
    pub async fn get(
        &self,
        requester: &Requester,
        target: &UserUuid,
        options: &ReadOptions,
    ) -> Result<Option<Projection>, AccountError> {
        debug!(requester = %requester.uuid, target = %target, view = ?options.view, "Reading user");
        self.authorize(requester, target)?;

        Ok(self
            .repository
            .get(target)
            .await?
            .map(|user| self.policy.resolve_read_projection(requester.role, &user, options)))
    }

    /// Create an account from administrator-supplied data, answering with the
    /// projection selected by `options`
    pub async fn create(
        &self,
        requester: &Requester,
        input: &Map<String, Value>,
        options: &ReadOptions,
    ) -> Result<Projection, AccountError> {
        debug!(requester = %requester.uuid, "Creating user");
        if !requester.role.is_admin() {
            warn!(requester = %requester.uuid, "Non-administrator attempted to create a user");
            return Err(AccountError::access_denied("Only administrators can create users"));
        }

        let user = self.register(requester.uuid.as_str(), input).await?;

        Ok(self.policy.resolve_read_projection(requester.role, &user, options))
    }

    /// Seed the first administrator; does nothing once any account exists
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AccountError> {
        if self.repository.count().await? > 0 {
            return Ok(None);
        }

        let input = json!({
            "email": email,
            "password": password,
            "status": UserStatus::Active.as_str(),
            "scopes": [USER_SCOPE, ADMIN_SCOPE],
        });
        let input = input.as_object().cloned().unwrap_or_default();

        self.register(SYSTEM_ACTOR, &input).await.map(Some)
    }

    /// Build from the template, validate, persist and audit a new account
    async fn register(&self, actor: &str, input: &Map<String, Value>) -> Result<User, AccountError> {
        let mut submitted = self.policy.filter_input(Role::Admin, WriteOperation::Create, input);
        drop_blank_credential(&mut submitted);

        let mut user = User::template(Utc::now());
        let mut candidate = user.internal_fields();
        candidate.extend(submitted.clone());

        let mut errors = match self.validator.validate(&candidate, true) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.check_email_unique(&submitted, None, None, &mut errors).await?;
        errors.into_result()?;

        self.apply(&mut user, &submitted)?;

        let user = self.repository.create(user).await?;
        info!(uuid = %user.uuid(), "User created");

        self.record(
            AuditEntry::new(user.uuid().clone(), actor, AuditEvent::UserRegistered)
                .with_new(user.snapshot()),
        )
        .await?;

        Ok(user)
    }

    /// Merge or replace a user record and answer with the projection selected by
    /// `options`; an absent target is `Ok(None)`
    pub async fn update(
        &self,
        requester: &Requester,
        target: &UserUuid,
        input: &Map<String, Value>,
        mode: WriteOperation,
        options: &ReadOptions,
    ) -> Result<Option<Projection>, AccountError> {
        debug!(requester = %requester.uuid, target = %target, mode = ?mode, "Updating user");
        self.authorize(requester, target)?;
        if mode == WriteOperation::Replace && !requester.role.is_admin() {
            warn!(requester = %requester.uuid, "Non-administrator attempted a full replace");
            return Err(AccountError::access_denied("Only administrators can replace users"));
        }
        if mode == WriteOperation::Create {
            return Err(AccountError::invalid_request("Create is not an update mode"));
        }

        let Some(mut user) = self.repository.get(target).await? else {
            return Ok(None);
        };

        let mut submitted = self.policy.filter_input(requester.role, mode, input);
        drop_blank_credential(&mut submitted);

        let mut errors = match self.validator.validate(&submitted, false) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.check_email_unique(&submitted, user.email(), Some(target), &mut errors)
            .await?;
        errors.into_result()?;

        let before = user.clone();
        if mode == WriteOperation::Replace {
            user.clear_replaceable();
        }
        self.apply(&mut user, &submitted)?;

        let user = self.repository.update(user).await?;
        info!(uuid = %user.uuid(), mode = ?mode, "User updated");

        self.record(
            AuditEntry::new(user.uuid().clone(), requester.uuid.as_str(), AuditEvent::UserDataUpdated)
                .with_old(before.snapshot())
                .with_new(user.snapshot()),
        )
        .await?;

        Ok(Some(self.policy.resolve_read_projection(requester.role, &user, options)))
    }

    /// Soft delete by closing the account; an absent target is `Ok(None)`
    pub async fn delete(
        &self,
        requester: &Requester,
        target: &UserUuid,
    ) -> Result<Option<DeleteOutcome>, AccountError> {
        debug!(requester = %requester.uuid, target = %target, "Deleting user");
        if !requester.role.is_admin() {
            warn!(requester = %requester.uuid, "Non-administrator attempted to delete a user");
            return Err(AccountError::access_denied("Only administrators can delete users"));
        }
        if &requester.uuid == target {
            warn!(requester = %requester.uuid, "Administrator attempted to delete themself");
            return Err(AccountError::access_denied("User cannot delete themself"));
        }

        let Some(mut user) = self.repository.get(target).await? else {
            return Ok(None);
        };

        let before = user.clone();
        user.close();

        let user = match self.repository.update(user).await {
            Ok(user) => user,
            Err(e) => {
                warn!(target = %target, error = %e, "Failed to persist account closure");
                return Ok(Some(DeleteOutcome { deleted: false }));
            }
        };
        info!(uuid = %user.uuid(), "User closed");

        self.record(
            AuditEntry::new(user.uuid().clone(), requester.uuid.as_str(), AuditEvent::UserDeleted)
                .with_old(before.snapshot())
                .with_new(user.snapshot()),
        )
        .await?;

        Ok(Some(DeleteOutcome { deleted: true }))
    }

    /// Record a login for an already authenticated identity
    pub async fn login(&self, uuid: &UserUuid) -> Result<LoginOutcome, AccountError> {
        debug!(uuid = %uuid, "Login");
        let Some(mut user) = self.repository.get(uuid).await? else {
            warn!(uuid = %uuid, "Login denied: account not found");
            return Ok(LoginOutcome::Denied(LoginDenial::AccountNotFound));
        };

        if let Some(denial) = user.login_denial() {
            warn!(uuid = %uuid, reason = %denial, "Login denied");
            return Ok(LoginOutcome::Denied(denial));
        }

        user.record_login(Utc::now());
        let user = self.repository.update(user).await?;
        info!(uuid = %uuid, login_count = user.login_count(), "User logged in");

        self.record(AuditEntry::new(user.uuid().clone(), actor_for(&user), AuditEvent::UserLogin))
            .await?;

        Ok(LoginOutcome::Success(user))
    }

    /// Verify an email/credential pair, then log the account in
    ///
    /// Unknown emails and wrong credentials are indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, AccountError> {
        debug!("Authenticating by email");
        let Some(user) = self.repository.get_by_email(email).await? else {
            return Ok(LoginOutcome::Denied(LoginDenial::InvalidCredentials));
        };

        let verified = user
            .credential_hash()
            .is_some_and(|digest| self.hasher.verify(password, digest));
        if !verified {
            warn!(uuid = %user.uuid(), "Login denied: invalid credentials");
            return Ok(LoginOutcome::Denied(LoginDenial::InvalidCredentials));
        }

        self.login(user.uuid()).await
    }

    /// Record a logout; unknown identities are silently accepted
    pub async fn logout(&self, uuid: &UserUuid) -> Result<(), AccountError> {
        debug!(uuid = %uuid, "Logout");
        if let Some(user) = self.repository.get(uuid).await? {
            self.record(AuditEntry::new(user.uuid().clone(), actor_for(&user), AuditEvent::UserLogout))
                .await?;
            info!(uuid = %uuid, "User logged out");
        }
        Ok(())
    }

    /// Read profile data; an absent target is `Ok(None)`
    pub async fn profile(
        &self,
        requester: &Requester,
        target: &UserUuid,
        keys: &[String],
    ) -> Result<Option<ProfileView>, AccountError> {
        debug!(requester = %requester.uuid, target = %target, "Reading profile");
        self.authorize(requester, target)?;

        if self.repository.get(target).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.profiles.get(target, keys).await?))
    }

    /// Write profile data and audit the touched keys; an absent target is `Ok(None)`
    pub async fn update_profile(
        &self,
        requester: &Requester,
        target: &UserUuid,
        entries: BTreeMap<String, ProfileValue>,
    ) -> Result<Option<ProfileData>, AccountError> {
        debug!(requester = %requester.uuid, target = %target, keys = entries.len(), "Updating profile");
        self.authorize(requester, target)?;

        if self.repository.get(target).await?.is_none() {
            return Ok(None);
        }

        let keys: Vec<String> = entries.keys().cloned().collect();
        let before = self.profiles.stored(target, &keys).await?;
        let after = self.profiles.set(target, entries).await?;
        info!(uuid = %target, keys = keys.len(), "Profile updated");

        self.record(
            AuditEntry::new(target.clone(), requester.uuid.as_str(), AuditEvent::ProfileUpdated)
                .with_old(profile_snapshot(&before))
                .with_new(profile_snapshot(&after)),
        )
        .await?;

        Ok(Some(after))
    }

    fn authorize(&self, requester: &Requester, target: &UserUuid) -> Result<(), AccountError> {
        if requester.can_access(target) {
            return Ok(());
        }
        warn!(requester = %requester.uuid, target = %target, "Access denied to another user's record");
        Err(AccountError::access_denied("Not authorized to access this user"))
    }

    /// Email must not be held by another account
    async fn check_email_unique(
        &self,
        submitted: &Map<String, Value>,
        current: Option<&str>,
        owner: Option<&UserUuid>,
        errors: &mut ValidationErrors,
    ) -> Result<(), AccountError> {
        let name = UserField::Email.name();
        let Some(email) = submitted.get(name).and_then(Value::as_str).map(str::trim) else {
            return Ok(());
        };
        if email.is_empty() || errors.violations().iter().any(|v| v.field == name) {
            return Ok(());
        }
        if current.is_some_and(|c| c.eq_ignore_ascii_case(email)) {
            return Ok(());
        }
        if self.repository.email_taken(email, owner).await? {
            errors.push(name, ValidationRule::Unique);
        }
        Ok(())
    }

    /// Apply validated input, hashing a supplied credential
    fn apply(&self, user: &mut User, submitted: &Map<String, Value>) -> Result<(), AccountError> {
        let mut errors = ValidationErrors::new();

        for (name, value) in submitted {
            let Some(field) = UserField::from_name(name) else {
                continue;
            };
            if field == UserField::Password {
                if let Some(plaintext) = value.as_str() {
                    let digest = self.hasher.hash(plaintext).map_err(AccountError::Credential)?;
                    user.set_credential_hash(digest);
                }
                continue;
            }
            if let Err(violation) = user.set_field(field, value) {
                errors.push(violation.field, violation.rule);
            }
        }

        Ok(errors.into_result()?)
    }

    async fn record(&self, entry: AuditEntry) -> Result<(), AccountError> {
        let event = entry.event();
        self.audit.write(entry).await.map_err(|e| {
            error!(event = %event, error = %e, "Change committed but audit entry was not written");
            AccountError::AuditWrite(e)
        })
    }
}

fn drop_blank_credential(submitted: &mut Map<String, Value>) {
    let name = UserField::Password.name();
    if is_blank(submitted.get(name)) {
        submitted.remove(name);
    }
}

fn actor_for(user: &User) -> String {
    user.email()
        .map(str::to_string)
        .unwrap_or_else(|| user.uuid().to_string())
}

fn profile_snapshot(data: &ProfileData) -> Value {
    Value::Object(
        data.iter()
            .map(|(key, value)| {
                (
                    key.clone(),
                    value.clone().map(Value::String).unwrap_or(Value::Null),
                )
            })
            .collect(),
    )
}
