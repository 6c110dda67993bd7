//! Actor identities and roles
//!
//! The engine performs no cryptographic verification: the surrounding
//! runtime hands it an already-verified [`Actor`] (identity plus the
//! role resolved for that identity), and guards only compare those
//! against stored fields.

use serde::{Deserialize, Serialize};

// ── Actor Identifier ─────────────────────────────────────────────────

/// Verified caller identity, opaque to the engine
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Roles ────────────────────────────────────────────────────────────

/// Role a stage may require of the submitting actor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    /// Workspace administrator
    Admin,
    /// Reviews and signs off on manual-approval stages
    Approver,
    /// Executes operator stages
    Operator,
    /// Performs finalization stages
    Finalizer,
}

// ── Actor ────────────────────────────────────────────────────────────

/// A verified caller: identity plus resolved role
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: ActorId, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(ActorId::new(id), ActorRole::Admin)
    }

    pub fn operator(id: impl Into<String>) -> Self {
        Self::new(ActorId::new(id), ActorRole::Operator)
    }

    pub fn approver(id: impl Into<String>) -> Self {
        Self::new(ActorId::new(id), ActorRole::Approver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id() {
        let generated = ActorId::generate();
        assert!(!generated.0.is_empty());
        assert!(generated.short().len() <= 8);

        let named = ActorId::new("alice");
        assert_eq!(format!("{}", named), "alice");
    }

    #[test]
    fn test_actor_constructors() {
        let admin = Actor::admin("root");
        assert_eq!(admin.role, ActorRole::Admin);

        let op = Actor::operator("worker");
        assert_eq!(op.role, ActorRole::Operator);
        assert_ne!(admin, op);
    }
}
