//! Cryptographic primitives: ed25519 key pairs and their strkey forms

use crate::error::LedgerError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use stellar_strkey::ed25519;

/// Raw ed25519 public key bytes.
pub type PublicKeyBytes = [u8; 32];

/// Encode raw public key bytes as a `G...` account id.
pub fn encode_account_id(public_key: &PublicKeyBytes) -> String {
    ed25519::PublicKey(*public_key).to_string()
}

/// Decode a `G...` account id into raw public key bytes.
pub fn decode_account_id(account_id: &str) -> Result<PublicKeyBytes, LedgerError> {
    ed25519::PublicKey::from_string(account_id.trim())
        .map(|key| key.0)
        .map_err(|_| LedgerError::CryptoError(format!("Invalid account id '{}'", account_id)))
}

/// Encode a raw ed25519 seed as an `S...` secret.
pub fn encode_secret_seed(seed: &[u8; 32]) -> String {
    ed25519::PrivateKey(*seed).to_string()
}

/// Decode an `S...` secret into the raw ed25519 seed.
pub fn decode_secret_seed(secret: &str) -> Result<[u8; 32], LedgerError> {
    ed25519::PrivateKey::from_string(secret.trim())
        .map(|key| key.0)
        .map_err(|_| LedgerError::CryptoError("Invalid secret seed".to_string()))
}

pub fn is_valid_account_id(account_id: &str) -> bool {
    decode_account_id(account_id).is_ok()
}

#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the seed.
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish()
    }
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn random() -> Self {
        KeyPair {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuilds a KeyPair from an `S...` secret seed.
    pub fn from_secret_seed(secret: &str) -> Result<Self, LedgerError> {
        let seed = decode_secret_seed(secret)?;
        Ok(Self::from_seed_bytes(&seed))
    }

    pub fn from_seed_bytes(seed: &[u8; 32]) -> Self {
        KeyPair {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key_bytes(&self) -> PublicKeyBytes {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The `G...` account id for this key.
    pub fn public_key(&self) -> String {
        encode_account_id(&self.public_key_bytes())
    }

    /// The `S...` secret seed for this key.
    pub fn secret_seed(&self) -> String {
        encode_secret_seed(&self.signing_key.to_bytes())
    }

    /// Last four bytes of the public key, used to match signatures to signers.
    pub fn signature_hint(&self) -> [u8; 4] {
        let public = self.public_key_bytes();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public[28..]);
        hint
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Verifies an ed25519 signature given the raw public key bytes, message, and signature bytes.
pub fn verify_signature(
    public_key: &PublicKeyBytes,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), LedgerError> {
    let signature_bytes: [u8; 64] = signature_bytes.try_into().map_err(|_| {
        LedgerError::CryptoError(format!(
            "Signature must be exactly 64 bytes, got {}",
            signature_bytes.len()
        ))
    })?;
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| LedgerError::CryptoError(format!("Invalid public key: {}", e)))?;
    let signature = Signature::from_bytes(&signature_bytes);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| LedgerError::CryptoError("Signature verification failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED_SEVENS: &str = "SADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP54X";
    const PUBLIC_SEVENS: &str = "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57";

    #[test]
    fn test_zero_account_id() {
        assert_eq!(
            encode_account_id(&[0u8; 32]),
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        );
    }

    #[test]
    fn test_known_seed_derives_known_account() {
        let keypair = KeyPair::from_secret_seed(SEED_SEVENS).unwrap();
        assert_eq!(keypair.public_key(), PUBLIC_SEVENS);
        assert_eq!(keypair.secret_seed(), SEED_SEVENS);
        assert_eq!(
            hex::encode(keypair.public_key_bytes()),
            "ea4a6c63e29c520abef5507b132ec5f9954776aebebe7b92421eea691446d22c"
        );
    }

    #[test]
    fn test_random_keypair_round_trips_through_seed() {
        let keypair = KeyPair::random();
        assert!(keypair.public_key().starts_with('G'));
        assert!(keypair.secret_seed().starts_with('S'));

        let restored = KeyPair::from_secret_seed(&keypair.secret_seed()).unwrap();
        assert_eq!(restored.public_key(), keypair.public_key());
    }

    #[test]
    fn test_account_id_rejected_as_seed() {
        let err = KeyPair::from_secret_seed(PUBLIC_SEVENS).unwrap_err();
        assert_eq!(err.to_string(), "Cryptographic error: Invalid secret seed");
        assert!(decode_account_id(SEED_SEVENS).is_err());
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut tampered = PUBLIC_SEVENS.to_string();
        tampered.replace_range(10..11, if &PUBLIC_SEVENS[10..11] == "A" { "B" } else { "A" });
        let err = decode_account_id(&tampered).unwrap_err();
        assert!(err.to_string().contains("Invalid account id"));
    }

    #[test]
    fn test_wrong_length() {
        assert!(decode_account_id("GABC").is_err());
        assert!(!is_valid_account_id("GABC..."));
    }

    #[test]
    fn test_signature_hint_is_key_suffix() {
        let keypair = KeyPair::from_secret_seed(SEED_SEVENS).unwrap();
        assert_eq!(keypair.signature_hint(), [0x14, 0x46, 0xd2, 0x2c]);
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::random();
        let message = b"CARBON trustline";
        let signature = keypair.sign(message);

        assert!(verify_signature(&keypair.public_key_bytes(), message, &signature).is_ok());

        let other = KeyPair::random();
        let result = verify_signature(&other.public_key_bytes(), message, &signature);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Cryptographic error: Signature verification failed"
        );
    }

    #[test]
    fn test_short_signature() {
        let keypair = KeyPair::random();
        let signature = keypair.sign(b"msg");
        let result = verify_signature(&keypair.public_key_bytes(), b"msg", &signature[1..]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Signature must be exactly"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = KeyPair::from_secret_seed(SEED_SEVENS).unwrap();
        let debug = format!("{:?}", keypair);
        assert!(debug.contains(PUBLIC_SEVENS));
        assert!(!debug.contains(SEED_SEVENS));
    }
}
