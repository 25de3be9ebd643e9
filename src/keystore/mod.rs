/// Keystore access for the export pipeline.
///
/// The pipeline only needs two lookups: a private key by alias and the
/// certificate paired with it. Both go through the `Keystore` trait so the
/// actual store format stays pluggable:
/// - `FileKeystore`: a directory of PKCS#8 key files and DER/PEM certificates
/// - `MemoryKeystore`: in-memory store for tests and embedding
pub mod file;
pub mod memory;

use std::fmt;
use std::path::{Path, PathBuf};

use pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use zeroize::Zeroizing;

use crate::error::{ExportError, Result};

pub use file::FileKeystore;
pub use memory::MemoryKeystore;

const OID_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
const OID_EC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// Identifies a private key in a keystore: store location, alias, and
/// optional passwords. A lookup descriptor, not a secret container.
#[derive(Clone)]
pub struct KeystoreKey {
    path: PathBuf,
    alias: String,
    store_password: Option<Zeroizing<String>>,
    key_password: Option<Zeroizing<String>>,
}

impl KeystoreKey {
    pub fn new(path: impl Into<PathBuf>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: alias.into(),
            store_password: None,
            key_password: None,
        }
    }

    pub fn with_passwords(
        path: impl Into<PathBuf>,
        alias: impl Into<String>,
        store_password: Option<String>,
        key_password: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            alias: alias.into(),
            store_password: store_password.map(Zeroizing::new),
            key_password: key_password.map(Zeroizing::new),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Store password, defaulting to the key password when absent.
    pub fn store_password(&self) -> Option<&str> {
        self.store_password
            .as_deref()
            .or(self.key_password.as_deref())
            .map(String::as_str)
    }

    /// Key password, defaulting to the store password when absent.
    pub fn key_password(&self) -> Option<&str> {
        self.key_password
            .as_deref()
            .or(self.store_password.as_deref())
            .map(String::as_str)
    }
}

impl fmt::Debug for KeystoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreKey")
            .field("path", &self.path)
            .field("alias", &self.alias)
            .field("store_password", &self.store_password.as_ref().map(|_| "<redacted>"))
            .field("key_password", &self.key_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Key algorithm, detected from the PKCS#8 AlgorithmIdentifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Dsa,
    Ec,
    Ed25519,
}

impl KeyAlgorithm {
    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        if oid == OID_RSA {
            Some(Self::Rsa)
        } else if oid == OID_DSA {
            Some(Self::Dsa)
        } else if oid == OID_EC {
            Some(Self::Ec)
        } else if oid == OID_ED25519 {
            Some(Self::Ed25519)
        } else {
            None
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rsa => "RSA",
            Self::Dsa => "DSA",
            Self::Ec => "EC",
            Self::Ed25519 => "Ed25519",
        };
        f.write_str(name)
    }
}

/// A private key loaded from a keystore: its algorithm plus the PKCS#8 DER.
///
/// The algorithm tag is available without parsing the key material, so
/// policy checks (e.g. the signing allowlist) can run before the DER is ever
/// touched.
#[derive(Debug)]
pub struct PrivateKeyEntry {
    algorithm: KeyAlgorithm,
    der: Zeroizing<Vec<u8>>,
}

impl PrivateKeyEntry {
    /// Build an entry from PKCS#8 DER, detecting the algorithm from the
    /// embedded AlgorithmIdentifier OID.
    pub fn from_pkcs8_der(der: Vec<u8>) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der.as_slice())
            .map_err(|e| ExportError::KeyFormat(format!("Invalid PKCS#8 private key: {e}")))?;
        let oid = info.algorithm.oid;
        let algorithm = KeyAlgorithm::from_oid(oid)
            .ok_or_else(|| ExportError::KeyFormat(format!("Unrecognized key algorithm OID {oid}")))?;
        Ok(Self {
            algorithm,
            der: Zeroizing::new(der),
        })
    }

    /// Build an entry from explicit parts. The DER is not validated.
    pub fn new(algorithm: KeyAlgorithm, der: Vec<u8>) -> Self {
        Self {
            algorithm,
            der: Zeroizing::new(der),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn pkcs8_der(&self) -> &[u8] {
        &self.der
    }
}

/// Trait for pluggable keystores.
pub trait Keystore {
    /// Load the private key identified by `key`.
    fn private_key(&self, key: &KeystoreKey) -> Result<PrivateKeyEntry>;

    /// Load the DER-encoded X.509 certificate paired with `key`.
    fn certificate_der(&self, key: &KeystoreKey) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_defaulting() {
        let both_absent = KeystoreKey::new("/tmp/store", "a");
        assert_eq!(both_absent.store_password(), None);
        assert_eq!(both_absent.key_password(), None);

        let store_only =
            KeystoreKey::with_passwords("/tmp/store", "a", Some("sp".into()), None);
        assert_eq!(store_only.store_password(), Some("sp"));
        assert_eq!(store_only.key_password(), Some("sp"));

        let key_only = KeystoreKey::with_passwords("/tmp/store", "a", None, Some("kp".into()));
        assert_eq!(key_only.store_password(), Some("kp"));
        assert_eq!(key_only.key_password(), Some("kp"));

        let both =
            KeystoreKey::with_passwords("/tmp/store", "a", Some("sp".into()), Some("kp".into()));
        assert_eq!(both.store_password(), Some("sp"));
        assert_eq!(both.key_password(), Some("kp"));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let key =
            KeystoreKey::with_passwords("/tmp/store", "a", Some("hunter2".into()), None);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_algorithm_detection_from_pkcs8() {
        use pkcs8::EncodePrivateKey;
        let rsa_key = rsa::RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
        let der = rsa_key.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let entry = PrivateKeyEntry::from_pkcs8_der(der).unwrap();
        assert_eq!(entry.algorithm(), KeyAlgorithm::Rsa);

        let ec_key = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let der = ec_key.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let entry = PrivateKeyEntry::from_pkcs8_der(der).unwrap();
        assert_eq!(entry.algorithm(), KeyAlgorithm::Ec);
    }

    #[test]
    fn test_malformed_pkcs8_rejected() {
        let err = PrivateKeyEntry::from_pkcs8_der(vec![0xFF; 12]).unwrap_err();
        assert!(matches!(err, ExportError::KeyFormat(_)));
    }
}
