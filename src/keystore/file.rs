/// File-based keystore: the keystore path is a directory, the alias names a
/// PKCS#8 key file inside it (`<alias>.p8`, `.pk8`, `.pem` or `.key`), and
/// the paired certificate lives next to it (`<alias>.crt`, `.cer` or
/// `.crt.pem`). Keys may be plain or PBES2-encrypted PKCS#8, PEM-armored or
/// raw DER; encrypted keys are unlocked with the key password.
use std::fs;
use std::path::{Path, PathBuf};

use pkcs8::{Document, EncryptedPrivateKeyInfo, PrivateKeyInfo};
use zeroize::Zeroizing;

use crate::error::{ExportError, Result};
use crate::keystore::{Keystore, KeystoreKey, PrivateKeyEntry};

const KEY_EXTENSIONS: [&str; 4] = ["p8", "pk8", "pem", "key"];
const CERT_EXTENSIONS: [&str; 3] = ["crt", "cer", "crt.pem"];

pub struct FileKeystore;

impl FileKeystore {
    fn resolve(dir: &Path, alias: &str, extensions: &[&str]) -> Option<PathBuf> {
        extensions
            .iter()
            .map(|ext| dir.join(format!("{alias}.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    fn decrypt_pkcs8(der: &[u8], key: &KeystoreKey) -> Result<Zeroizing<Vec<u8>>> {
        let password = key.key_password().ok_or_else(|| {
            ExportError::KeyRetrieval(format!(
                "Key '{}' is encrypted but no password was supplied",
                key.alias()
            ))
        })?;
        let encrypted = EncryptedPrivateKeyInfo::try_from(der).map_err(|e| {
            ExportError::KeyRetrieval(format!(
                "Key file for alias '{}' is neither plain nor encrypted PKCS#8: {e}",
                key.alias()
            ))
        })?;
        let document = encrypted.decrypt(password).map_err(|e| {
            ExportError::KeyRetrieval(format!(
                "Failed to decrypt key '{}' (wrong password?): {e}",
                key.alias()
            ))
        })?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    fn read_key_der(path: &Path, key: &KeystoreKey) -> Result<Zeroizing<Vec<u8>>> {
        let raw = fs::read(path)?;
        match std::str::from_utf8(&raw) {
            Ok(text) if text.contains("-----BEGIN") => {
                let (label, document) = Document::from_pem(text.trim()).map_err(|e| {
                    ExportError::KeyRetrieval(format!(
                        "Invalid PEM in key file {}: {e}",
                        path.display()
                    ))
                })?;
                match label {
                    "PRIVATE KEY" => Ok(Zeroizing::new(document.as_bytes().to_vec())),
                    "ENCRYPTED PRIVATE KEY" => Self::decrypt_pkcs8(document.as_bytes(), key),
                    other => Err(ExportError::KeyRetrieval(format!(
                        "Unexpected PEM label '{other}' in key file {}",
                        path.display()
                    ))),
                }
            }
            _ => {
                if PrivateKeyInfo::try_from(raw.as_slice()).is_ok() {
                    Ok(Zeroizing::new(raw))
                } else {
                    Self::decrypt_pkcs8(&raw, key)
                }
            }
        }
    }
}

impl Keystore for FileKeystore {
    fn private_key(&self, key: &KeystoreKey) -> Result<PrivateKeyEntry> {
        let path = Self::resolve(key.path(), key.alias(), &KEY_EXTENSIONS).ok_or_else(|| {
            ExportError::KeyRetrieval(format!(
                "No key file for alias '{}' in {}",
                key.alias(),
                key.path().display()
            ))
        })?;
        let der = Self::read_key_der(&path, key)?;
        PrivateKeyEntry::from_pkcs8_der(der.to_vec())
    }

    fn certificate_der(&self, key: &KeystoreKey) -> Result<Vec<u8>> {
        let path = Self::resolve(key.path(), key.alias(), &CERT_EXTENSIONS).ok_or_else(|| {
            ExportError::KeyRetrieval(format!(
                "No certificate for alias '{}' in {}",
                key.alias(),
                key.path().display()
            ))
        })?;
        let raw = fs::read(&path)?;
        match std::str::from_utf8(&raw) {
            Ok(text) if text.contains("-----BEGIN") => {
                let (label, document) = Document::from_pem(text.trim()).map_err(|e| {
                    ExportError::KeyRetrieval(format!(
                        "Invalid PEM in certificate file {}: {e}",
                        path.display()
                    ))
                })?;
                if label != "CERTIFICATE" {
                    return Err(ExportError::KeyRetrieval(format!(
                        "Unexpected PEM label '{label}' in certificate file {}",
                        path.display()
                    )));
                }
                Ok(document.as_bytes().to_vec())
            }
            _ => Ok(raw),
        }
    }
}
