//! Scripting-environment handles.
//!
//! Every dispatch operation targets exactly one scripting-environment
//! instance. The [`Realm`] handle is passed explicitly into payload decoding
//! and port entanglement so that several environments can coexist in one
//! process (and in tests) without any process-wide singleton lookup.

use serde::{Deserialize, Serialize};

/// Identifier for a scripting-environment instance.
///
/// Realm ids are assigned by whoever owns the environments (typically the
/// embedder, one id per top-level context) and are only compared and
/// displayed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RealmId(u64);

impl RealmId {
    /// Create a realm id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RealmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "realm-{}", self.0)
    }
}

/// Handle for one scripting-environment instance.
///
/// A `Realm` owns no environment state itself. It names the target
/// environment for decode and entangle calls and shows up in diagnostics;
/// the actual object graph lives behind the emitter collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Realm {
    id: RealmId,
    label: String,
}

impl Realm {
    /// Create a realm handle with a human-readable label.
    ///
    /// The label is used only in diagnostics output.
    pub fn new(id: RealmId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Get the realm id.
    pub const fn id(&self) -> RealmId {
        self.id
    }

    /// Get the diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Display for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realm_id_display() {
        assert_eq!(RealmId::new(7).to_string(), "realm-7");
    }

    #[test]
    fn test_realm_id_raw_roundtrip() {
        let id = RealmId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(RealmId::new(id.raw()), id);
    }

    #[test]
    fn test_realm_display_includes_label() {
        let realm = Realm::new(RealmId::new(3), "main-window");
        assert_eq!(realm.to_string(), "realm-3 (main-window)");
    }

    #[test]
    fn test_realm_equality() {
        let a = Realm::new(RealmId::new(1), "a");
        let b = Realm::new(RealmId::new(1), "a");
        let c = Realm::new(RealmId::new(2), "a");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_realm_id_serde_roundtrip() {
        let id = RealmId::new(9000);
        let json = serde_json::to_string(&id).expect("serialize");
        let decoded: RealmId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, decoded);
    }
}
