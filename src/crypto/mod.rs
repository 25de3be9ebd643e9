/// Cryptographic building blocks for the export pipeline.
///
/// - `key_wrap`: CKM_RSA_AES_KEY_WRAP (RSA-OAEP-SHA1 + AES-KWP)
/// - `hybrid`: hybrid EC encryption seam and default ECIES-style backend
/// - `sign`: detached SHA-512 signatures, restricted to RSA and DSA
/// - `pem`: exact PEM encoding for private keys and certificates
pub mod hybrid;
pub mod key_wrap;
pub mod pem;
pub mod sign;
