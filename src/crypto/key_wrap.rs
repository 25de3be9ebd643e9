/// CKM_RSA_AES_KEY_WRAP composite encryption.
///
/// A fresh 256-bit AES key is drawn per call, encrypted with RSA-OAEP, and
/// used to wrap the payload with AES Key Wrap with Padding (RFC 5649). The
/// output is the concatenation of both ciphertexts with no delimiter; the
/// boundary is implicit from the RSA modulus size, which the decryptor knows
/// out of band.
///
/// OAEP uses SHA-1 for both the hash and the MGF1 hash. This is a legacy
/// interoperability requirement of existing verifiers; substituting SHA-256
/// breaks compatibility.
use aes_kw::KekAes256;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::error::{ExportError, Result};

/// Size of the ephemeral AES key encryption key.
pub const AES_KEY_LEN: usize = 32;

/// Parse an RSA public key from SPKI bytes, PEM-armored or raw DER.
pub fn parse_rsa_public_key(bytes: &[u8]) -> Result<RsaPublicKey> {
    match std::str::from_utf8(bytes) {
        Ok(text) if text.contains("-----BEGIN") => RsaPublicKey::from_public_key_pem(text.trim())
            .map_err(|e| ExportError::KeyFormat(format!("Invalid RSA public key PEM: {e}"))),
        _ => RsaPublicKey::from_public_key_der(bytes)
            .map_err(|e| ExportError::KeyFormat(format!("Invalid RSA public key DER: {e}"))),
    }
}

/// Encrypt `payload` for the holder of `wrapping_key`.
///
/// Returns `[RSA-OAEP wrapped AES key | AES-KWP wrapped payload]`.
pub fn encrypt(wrapping_key: &RsaPublicKey, payload: &[u8]) -> Result<Vec<u8>> {
    // Fresh KEK per invocation, never reused across calls.
    let mut kek_bytes = Zeroizing::new([0u8; AES_KEY_LEN]);
    OsRng.fill_bytes(&mut kek_bytes[..]);

    let wrapped_kek = wrapping_key
        .encrypt(&mut OsRng, Oaep::new::<Sha1>(), &kek_bytes[..])
        .map_err(|e| ExportError::Encryption(format!("RSA-OAEP encryption of AES key failed: {e}")))?;

    let kek = KekAes256::new(&(*kek_bytes).into());
    let wrapped_payload = kek
        .wrap_with_padding_vec(payload)
        .map_err(|e| ExportError::Encryption(format!("AES key wrap of payload failed: {e}")))?;

    let mut out = Vec::with_capacity(wrapped_kek.len() + wrapped_payload.len());
    out.extend_from_slice(&wrapped_kek);
    out.extend_from_slice(&wrapped_payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::traits::PublicKeyParts;
    use rsa::RsaPrivateKey;

    fn unwrap_payload(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Vec<u8> {
        let modulus_len = private_key.to_public_key().size();
        assert!(ciphertext.len() > modulus_len);
        let kek_bytes = private_key
            .decrypt(Oaep::new::<Sha1>(), &ciphertext[..modulus_len])
            .unwrap();
        assert_eq!(kek_bytes.len(), AES_KEY_LEN);
        let mut kek_arr = [0u8; AES_KEY_LEN];
        kek_arr.copy_from_slice(&kek_bytes);
        let kek = KekAes256::new(&kek_arr.into());
        kek.unwrap_with_padding_vec(&ciphertext[modulus_len..])
            .unwrap()
    }

    #[test]
    fn test_wrap_roundtrip_various_lengths() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public_key = private_key.to_public_key();
        for len in [0usize, 1, 15, 16, 17, 1000] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ciphertext = encrypt(&public_key, &payload).unwrap();
            assert_eq!(unwrap_payload(&private_key, &ciphertext), payload, "len {len}");
        }
    }

    #[test]
    fn test_fresh_aes_key_per_call() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public_key = private_key.to_public_key();
        let payload = b"the same payload twice";
        let first = encrypt(&public_key, payload).unwrap();
        let second = encrypt(&public_key, payload).unwrap();
        assert_ne!(first, second);
        // the symmetric halves must differ too, not just the RSA block
        let modulus_len = public_key.size();
        assert_ne!(first[modulus_len..], second[modulus_len..]);
    }

    #[test]
    fn test_parse_public_key_pem_and_der() {
        use rsa::pkcs8::EncodePublicKey;
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public_key = private_key.to_public_key();
        let der = public_key.to_public_key_der().unwrap();
        let pem = public_key
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        assert_eq!(parse_rsa_public_key(der.as_bytes()).unwrap(), public_key);
        assert_eq!(parse_rsa_public_key(pem.as_bytes()).unwrap(), public_key);
    }

    #[test]
    fn test_parse_public_key_rejects_garbage() {
        let err = parse_rsa_public_key(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, ExportError::KeyFormat(_)));
    }
}
