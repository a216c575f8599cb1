//! Encryption key lookup, injected into `Container::mount` rather than held globally

use std::collections::HashMap;

use unreal_helpers::Guid;

use crate::encryption::EncryptionKey;

/// Resolves the AES key for a container's `encryptionKeyGuid`
pub trait KeyResolver {
    /// Look up the key for `guid`, or `None` if this resolver doesn't have it
    fn lookup(&self, guid: &Guid) -> Option<EncryptionKey>;
}

/// A `KeyResolver` backed by an in-memory map, the common case for tests and small
/// tools that load a handful of keys up front.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<Guid, EncryptionKey>,
}

impl KeyRing {
    /// Start with no keys registered
    pub fn new() -> Self {
        KeyRing {
            keys: HashMap::new(),
        }
    }

    /// Register (or replace) the key for `guid`
    pub fn insert(&mut self, guid: Guid, key: EncryptionKey) {
        self.keys.insert(guid, key);
    }
}

impl KeyResolver for KeyRing {
    fn lookup(&self, guid: &Guid) -> Option<EncryptionKey> {
        self.keys.get(guid).copied()
    }
}

/// A resolver that never has a key, for mounting known-unencrypted containers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeys;

impl KeyResolver for NoKeys {
    fn lookup(&self, _guid: &Guid) -> Option<EncryptionKey> {
        None
    }
}
