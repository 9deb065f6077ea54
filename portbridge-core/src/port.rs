//! Raw transferable-port handles.
//!
//! A port is a transferable communication endpoint that can ride along with
//! a message across the process boundary. On arrival it exists only as a
//! [`PortDescriptor`]: a token naming one half of a remote pair, not yet
//! usable from the local environment. The dispatcher hands descriptors to
//! the port-broker collaborator, which entangles each one into a live local
//! channel object.

use serde::{Deserialize, Serialize};

/// 128-bit token identifying one endpoint of a transferred port pair.
///
/// Tokens are minted by whichever side created the pair and are never
/// interpreted here beyond equality and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PortToken {
    /// First 64 bits.
    pub first: u64,
    /// Second 64 bits.
    pub second: u64,
}

impl PortToken {
    /// Create a token with explicit values.
    pub const fn new(first: u64, second: u64) -> Self {
        Self { first, second }
    }

    /// Check if the token is valid (non-zero).
    pub const fn is_valid(&self) -> bool {
        self.first != 0 || self.second != 0
    }
}

impl std::fmt::Display for PortToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.first, self.second)
    }
}

/// Raw, environment-external handle for one transferred port endpoint.
///
/// Ownership semantics: a descriptor represents exclusive ownership of the
/// underlying endpoint. Descriptors move by value into the entangle step and
/// cease to exist once wrapped; holding one after entanglement would mean
/// two owners for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// Token naming the endpoint.
    pub token: PortToken,
}

impl PortDescriptor {
    /// Create a descriptor for the given token.
    pub const fn new(token: PortToken) -> Self {
        Self { token }
    }
}

impl std::fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port:{}", self.token)
    }
}
