use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::errors::{PayError, PayResult};
use crate::storage::{keys, KvStore};
use crate::validation;

/// What shape of identifier a user signed in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Email,
    Mobile,
    UserId,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Email => "email",
            IdentifierKind::Mobile => "mobile",
            IdentifierKind::UserId => "userid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(IdentifierKind::Email),
            "mobile" => Some(IdentifierKind::Mobile),
            "userid" => Some(IdentifierKind::UserId),
            _ => None,
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub identifier: String,
    pub identifier_kind: IdentifierKind,
    /// Device PIN attached to the signed-in user, if one is set. Persisted
    /// as a raw digit string for compatibility with existing stored data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

/// The authenticated snapshot written to exactly one storage tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSnapshot {
    is_authenticated: bool,
    user: User,
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    remember_me: bool,
    pin: Option<Zeroizing<String>>,
    app_lock_enabled: bool,
    biometric_enabled: bool,
}

/// Owns authentication status and device security preferences, persisting
/// them across restarts.
///
/// The authenticated snapshot lives in the durable tier when the user asked
/// to be remembered, otherwise in the ephemeral tier; the other tier is
/// always cleared. The PIN and lock preferences are device-scoped and
/// survive logout, so switching accounts does not wipe them.
#[derive(Debug, Clone)]
pub struct SessionManager {
    state: Arc<RwLock<SessionState>>,
    durable: Arc<dyn KvStore>,
    ephemeral: Arc<dyn KvStore>,
}

impl SessionManager {
    /// Build a manager over the two storage tiers, restoring any prior
    /// session and preferences.
    pub fn new(durable: Arc<dyn KvStore>, ephemeral: Arc<dyn KvStore>) -> Self {
        let state = Self::restore(durable.as_ref(), ephemeral.as_ref());
        Self {
            state: Arc::new(RwLock::new(state)),
            durable,
            ephemeral,
        }
    }

    fn restore(durable: &dyn KvStore, ephemeral: &dyn KvStore) -> SessionState {
        let mut state = SessionState {
            pin: durable.get(keys::PIN).map(Zeroizing::new),
            app_lock_enabled: flag(durable.get(keys::APP_LOCK_ENABLED)),
            biometric_enabled: flag(durable.get(keys::BIOMETRIC_ENABLED)),
            ..SessionState::default()
        };

        // Re-assert the lock invariants on whatever was stored.
        if state.app_lock_enabled && state.pin.is_none() {
            log::warn!("app lock was enabled without a stored PIN; disabling");
            state.app_lock_enabled = false;
        }
        if state.biometric_enabled && !state.app_lock_enabled {
            log::warn!("biometric was enabled without app lock; disabling");
            state.biometric_enabled = false;
        }

        let (snapshot, remembered) = match durable.get(keys::AUTH) {
            Some(raw) => (Some(raw), true),
            None => (ephemeral.get(keys::AUTH), false),
        };

        if let Some(raw) = snapshot {
            match serde_json::from_str::<AuthSnapshot>(&raw) {
                Ok(auth) if auth.is_authenticated => {
                    state.user = Some(auth.user);
                    state.remember_me = remembered;
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("stored session snapshot is malformed ({}); ignoring", err);
                }
            }
        }

        state
    }

    /// Sign in. No credential verification exists in the modeled system, so
    /// this only fails on validation or storage errors.
    pub fn login(
        &self,
        identifier: &str,
        kind: IdentifierKind,
        remember_me: bool,
    ) -> PayResult<User> {
        validation::validate_identifier(identifier, kind)?;

        let mut state = self.state.write();
        let user = User {
            id: Uuid::new_v4().to_string(),
            identifier: identifier.to_string(),
            identifier_kind: kind,
            pin: state.pin.as_ref().map(|pin| pin.as_str().to_string()),
        };

        // Durable writes first; memory is only updated once they succeed.
        self.durable.set(keys::LAST_IDENTIFIER, identifier)?;
        self.durable.set(keys::LAST_IDENTIFIER_KIND, kind.as_str())?;
        self.persist_auth(&user, remember_me)?;

        state.user = Some(user.clone());
        state.remember_me = remember_me;

        log::info!("user signed in via {}", kind);
        Ok(user)
    }

    /// Create an account and sign in. Supplying a PIN also establishes the
    /// PIN and enables app lock in the same step.
    pub fn signup(
        &self,
        identifier: &str,
        kind: IdentifierKind,
        remember_me: bool,
        pin: Option<&str>,
    ) -> PayResult<User> {
        validation::validate_identifier(identifier, kind)?;
        if let Some(pin) = pin {
            validation::validate_pin(pin)?;
        }

        let mut state = self.state.write();
        if let Some(pin) = pin {
            self.durable.set(keys::PIN, pin)?;
            self.durable.set(keys::APP_LOCK_ENABLED, "true")?;
        }

        let effective_pin = pin
            .map(str::to_string)
            .or_else(|| state.pin.as_ref().map(|pin| pin.as_str().to_string()));
        let user = User {
            id: Uuid::new_v4().to_string(),
            identifier: identifier.to_string(),
            identifier_kind: kind,
            pin: effective_pin,
        };

        self.durable.set(keys::LAST_IDENTIFIER, identifier)?;
        self.durable.set(keys::LAST_IDENTIFIER_KIND, kind.as_str())?;
        self.persist_auth(&user, remember_me)?;

        if let Some(pin) = pin {
            state.pin = Some(Zeroizing::new(pin.to_string()));
            state.app_lock_enabled = true;
        }
        state.user = Some(user.clone());
        state.remember_me = remember_me;

        log::info!("account created via {}", kind);
        Ok(user)
    }

    /// Sign out. The PIN and lock preferences stay on the device.
    pub fn logout(&self) -> PayResult<()> {
        let mut state = self.state.write();
        self.durable.remove(keys::AUTH)?;
        self.ephemeral.remove(keys::AUTH)?;
        state.user = None;
        state.remember_me = false;
        log::info!("user signed out");
        Ok(())
    }

    /// Establish a PIN. Also force-enables app lock.
    pub fn set_pin(&self, pin: &str) -> PayResult<()> {
        validation::validate_pin(pin)?;

        let mut state = self.state.write();
        self.durable.set(keys::PIN, pin)?;
        self.durable.set(keys::APP_LOCK_ENABLED, "true")?;

        let updated_user = state.user.clone().map(|mut user| {
            user.pin = Some(pin.to_string());
            user
        });
        if let Some(user) = &updated_user {
            self.persist_auth(user, state.remember_me)?;
        }

        state.pin = Some(Zeroizing::new(pin.to_string()));
        state.app_lock_enabled = true;
        state.user = updated_user;
        Ok(())
    }

    /// Replace an existing PIN.
    pub fn change_pin(&self, new_pin: &str) -> PayResult<()> {
        validation::validate_pin(new_pin)?;

        let mut state = self.state.write();
        if state.pin.is_none() {
            return Err(PayError::LockStateError(
                "No PIN is set; nothing to change".to_string(),
            ));
        }

        self.durable.set(keys::PIN, new_pin)?;
        let updated_user = state.user.clone().map(|mut user| {
            user.pin = Some(new_pin.to_string());
            user
        });
        if let Some(user) = &updated_user {
            self.persist_auth(user, state.remember_me)?;
        }

        state.pin = Some(Zeroizing::new(new_pin.to_string()));
        state.user = updated_user;
        Ok(())
    }

    /// Remove the PIN. App lock cannot exist without one, so this also
    /// force-disables app lock and biometric.
    pub fn remove_pin(&self) -> PayResult<()> {
        let mut state = self.state.write();
        self.durable.remove(keys::PIN)?;
        self.durable.set(keys::APP_LOCK_ENABLED, "false")?;
        self.durable.set(keys::BIOMETRIC_ENABLED, "false")?;

        let updated_user = state.user.clone().map(|mut user| {
            user.pin = None;
            user
        });
        if let Some(user) = &updated_user {
            self.persist_auth(user, state.remember_me)?;
        }

        state.pin = None;
        state.app_lock_enabled = false;
        state.biometric_enabled = false;
        state.user = updated_user;
        Ok(())
    }

    /// Check a PIN attempt against the stored PIN.
    pub fn verify_pin(&self, pin: &str) -> bool {
        let state = self.state.read();
        match &state.pin {
            Some(stored) => stored.as_str() == pin,
            None => false,
        }
    }

    /// Toggle the app-lock gate. Enabling requires a PIN; disabling also
    /// force-disables biometric.
    pub fn set_app_lock_enabled(&self, enabled: bool) -> PayResult<()> {
        let mut state = self.state.write();
        if enabled && state.pin.is_none() {
            return Err(PayError::LockStateError(
                "Cannot enable app lock without a PIN".to_string(),
            ));
        }

        self.durable
            .set(keys::APP_LOCK_ENABLED, flag_str(enabled))?;
        if !enabled {
            self.durable.set(keys::BIOMETRIC_ENABLED, "false")?;
        }

        state.app_lock_enabled = enabled;
        if !enabled {
            state.biometric_enabled = false;
        }
        Ok(())
    }

    /// Toggle biometric unlock. Only valid while app lock is enabled.
    pub fn set_biometric_enabled(&self, enabled: bool) -> PayResult<()> {
        let mut state = self.state.write();
        if enabled && !state.app_lock_enabled {
            return Err(PayError::LockStateError(
                "Cannot enable biometric while app lock is off".to_string(),
            ));
        }

        self.durable
            .set(keys::BIOMETRIC_ENABLED, flag_str(enabled))?;
        state.biometric_enabled = enabled;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().user.is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn remember_me(&self) -> bool {
        self.state.read().remember_me
    }

    pub fn has_pin_set(&self) -> bool {
        self.state.read().pin.is_some()
    }

    pub fn app_lock_enabled(&self) -> bool {
        self.state.read().app_lock_enabled
    }

    pub fn biometric_enabled(&self) -> bool {
        self.state.read().biometric_enabled
    }

    /// Identifier last used to sign in, for the PIN-login shortcut.
    pub fn last_identifier(&self) -> Option<(String, IdentifierKind)> {
        let identifier = self.durable.get(keys::LAST_IDENTIFIER)?;
        let kind = IdentifierKind::parse(&self.durable.get(keys::LAST_IDENTIFIER_KIND)?)?;
        Some((identifier, kind))
    }

    fn persist_auth(&self, user: &User, remember_me: bool) -> PayResult<()> {
        let snapshot = AuthSnapshot {
            is_authenticated: true,
            user: user.clone(),
        };
        let serialized = serde_json::to_string(&snapshot)?;

        if remember_me {
            self.durable.set(keys::AUTH, &serialized)?;
            self.ephemeral.remove(keys::AUTH)?;
        } else {
            self.ephemeral.set(keys::AUTH, &serialized)?;
            self.durable.remove(keys::AUTH)?;
        }
        Ok(())
    }
}

fn flag(value: Option<String>) -> bool {
    value.as_deref() == Some("true")
}

fn flag_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
