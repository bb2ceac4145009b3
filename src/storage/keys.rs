//! String keys of the persisted state layout. Stored values keep the shapes
//! existing TFC Pay installs already use, so data written by a previous
//! version of the app loads unchanged.

/// Authenticated session snapshot: `{"isAuthenticated": true, "user": {..}}`.
/// Lives in the durable or the ephemeral tier depending on "remember me".
pub const AUTH: &str = "tfc_auth";

/// Raw 4-digit PIN string. Kept unhashed for compatibility with stored data.
pub const PIN: &str = "tfc_pin";

/// `"true"` / `"false"` flag strings.
pub const APP_LOCK_ENABLED: &str = "tfc_app_lock_enabled";
pub const BIOMETRIC_ENABLED: &str = "tfc_biometric_enabled";

/// Last used identifier and identifier kind, for the PIN-login shortcut.
pub const LAST_IDENTIFIER: &str = "tfc_last_identifier";
pub const LAST_IDENTIFIER_KIND: &str = "tfc_last_type";

/// Balance as a decimal rupee string, e.g. `"1250.50"`.
pub const WALLET_BALANCE: &str = "tfc_wallet_balance";

/// JSON array of transactions, minus the icon field.
pub const TRANSACTIONS: &str = "tfc_transactions";
