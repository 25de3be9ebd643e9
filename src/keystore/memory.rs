/// In-memory keystore, used by tests and by embedders that already hold key
/// material.
use std::collections::HashMap;

use crate::error::{ExportError, Result};
use crate::keystore::{Keystore, KeystoreKey, PrivateKeyEntry};

struct MemoryEntry {
    password: Option<String>,
    key_der: Vec<u8>,
    certificate_der: Option<Vec<u8>>,
}

/// Keystore backed by a map from alias to key material.
///
/// The keystore path in a `KeystoreKey` is ignored; lookups go by alias.
#[derive(Default)]
pub struct MemoryKeystore {
    entries: HashMap<String, MemoryEntry>,
}

impl MemoryKeystore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under `alias`. `password`, when set, must match the
    /// key password of the lookup descriptor.
    pub fn insert(
        &mut self,
        alias: impl Into<String>,
        password: Option<&str>,
        key_der: Vec<u8>,
        certificate_der: Option<Vec<u8>>,
    ) {
        self.entries.insert(
            alias.into(),
            MemoryEntry {
                password: password.map(str::to_owned),
                key_der,
                certificate_der,
            },
        );
    }

    fn lookup(&self, key: &KeystoreKey) -> Result<&MemoryEntry> {
        let entry = self.entries.get(key.alias()).ok_or_else(|| {
            ExportError::KeyRetrieval(format!("Alias '{}' not found in keystore", key.alias()))
        })?;
        if entry.password.as_deref() != key.key_password() {
            return Err(ExportError::KeyRetrieval(format!(
                "Wrong password for alias '{}'",
                key.alias()
            )));
        }
        Ok(entry)
    }
}

impl Keystore for MemoryKeystore {
    fn private_key(&self, key: &KeystoreKey) -> Result<PrivateKeyEntry> {
        let entry = self.lookup(key)?;
        PrivateKeyEntry::from_pkcs8_der(entry.key_der.clone())
    }

    fn certificate_der(&self, key: &KeystoreKey) -> Result<Vec<u8>> {
        let entry = self.lookup(key)?;
        entry.certificate_der.clone().ok_or_else(|| {
            ExportError::KeyRetrieval(format!(
                "No certificate stored for alias '{}'",
                key.alias()
            ))
        })
    }
}
