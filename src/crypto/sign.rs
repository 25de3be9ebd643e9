/// Detached signatures over the encrypted payload.
///
/// Policy: only RSA and DSA signing keys are accepted, regardless of what
/// the underlying crypto stack could support. The algorithm check runs on
/// the key's algorithm tag before the key material is ever parsed.
///
/// The signature algorithm is always SHA-512 with the key's algorithm
/// (SHA512withRSA is PKCS#1 v1.5; SHA512withDSA is DER-encoded (r, s)).
/// Signature bytes are not guaranteed deterministic across calls.
use rsa::pkcs8::DecodePrivateKey;
use sha2::{Digest, Sha512};
use signature::{DigestSigner, SignatureEncoding, Signer as _};

use crate::error::{ExportError, Result};
use crate::keystore::{KeyAlgorithm, PrivateKeyEntry};

/// A detached signature plus the JCA-style name of the algorithm that
/// produced it.
#[derive(Debug)]
pub struct DetachedSignature {
    pub algorithm: String,
    pub bytes: Vec<u8>,
}

/// Sign `payload` with the given private key.
pub fn sign(key: &PrivateKeyEntry, payload: &[u8]) -> Result<DetachedSignature> {
    let algorithm = key.algorithm();
    let bytes = match algorithm {
        KeyAlgorithm::Rsa => {
            let private = rsa::RsaPrivateKey::from_pkcs8_der(key.pkcs8_der())
                .map_err(|e| ExportError::KeyFormat(format!("Invalid RSA signing key: {e}")))?;
            let signing_key = rsa::pkcs1v15::SigningKey::<Sha512>::new(private);
            signing_key
                .try_sign(payload)
                .map_err(|e| ExportError::Signing(format!("RSA signing failed: {e}")))?
                .to_vec()
        }
        KeyAlgorithm::Dsa => {
            let signing_key = dsa::SigningKey::from_pkcs8_der(key.pkcs8_der())
                .map_err(|e| ExportError::KeyFormat(format!("Invalid DSA signing key: {e}")))?;
            let signature: dsa::Signature = signing_key
                .try_sign_digest(Sha512::new_with_prefix(payload))
                .map_err(|e| ExportError::Signing(format!("DSA signing failed: {e}")))?;
            signature.to_vec()
        }
        other => return Err(ExportError::UnsupportedAlgorithm(other.to_string())),
    };
    Ok(DetachedSignature {
        algorithm: format!("SHA512with{algorithm}"),
        bytes,
    })
}
