//! Cryptographic key primitives for Keel node identities
//!
//! Long-term master identities are ed25519 keys; short-lived operational
//! signing keys are secp256k1 keys. Both travel in a unified 33-byte public
//! key encoding distinguished by the lead byte: `0xED || point` for ed25519,
//! or a SEC1 compressed point (`0x02`/`0x03` lead byte) for secp256k1.

use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::{Signer as _, Verifier as _};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

/// Lead byte marking an ed25519 key in the unified encoding
const ED25519_PREFIX: u8 = 0xED;

/// Signature algorithms in use on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Long-term master identity keys
    Ed25519,
    /// Short-lived operational signing keys
    Secp256k1,
}

/// Unified public key (33 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; 33]);

impl PublicKey {
    /// Create a PublicKey from its 33-byte encoding, validating the lead
    /// byte and the point decoding
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self> {
        match bytes[0] {
            ED25519_PREFIX => {
                let mut point = [0u8; 32];
                point.copy_from_slice(&bytes[1..]);
                ed25519_dalek::VerifyingKey::from_bytes(&point)
                    .map_err(|e| CoreError::Crypto(format!("Invalid ed25519 key: {}", e)))?;
            }
            0x02 | 0x03 => {
                k256::ecdsa::VerifyingKey::from_sec1_bytes(&bytes)
                    .map_err(|e| CoreError::Crypto(format!("Invalid secp256k1 key: {}", e)))?;
            }
            other => return Err(CoreError::UnsupportedKeyType(other)),
        }
        Ok(Self(bytes))
    }

    /// Algorithm of this key, derived from the lead byte
    pub fn key_type(&self) -> KeyType {
        if self.0[0] == ED25519_PREFIX {
            KeyType::Ed25519
        } else {
            KeyType::Secp256k1
        }
    }

    /// Get the 33-byte encoding
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 33];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| CoreError::Crypto(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Verify a signature over `message` under this key
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match self.key_type() {
            KeyType::Ed25519 => {
                let mut point = [0u8; 32];
                point.copy_from_slice(&self.0[1..]);
                let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&point)
                    .map_err(|e| CoreError::Crypto(format!("Invalid ed25519 key: {}", e)))?;
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| CoreError::Crypto(format!("Invalid signature format: {}", e)))?;
                verifying_key
                    .verify(message, &sig)
                    .map_err(|_| CoreError::SignatureVerificationFailed)
            }
            KeyType::Secp256k1 => {
                let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.0)
                    .map_err(|e| CoreError::Crypto(format!("Invalid secp256k1 key: {}", e)))?;
                let sig = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| CoreError::Crypto(format!("Invalid signature format: {}", e)))?;
                verifying_key
                    .verify(message, &sig)
                    .map_err(|_| CoreError::SignatureVerificationFailed)
            }
        }
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Secret key material, zeroized on drop
///
/// The public key is derived once at construction so later accessors cannot
/// fail on malformed scalars.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    key_type: KeyType,
    scalar: [u8; 32],
    #[zeroize(skip)]
    public: [u8; 33],
}

impl SecretKey {
    /// Generate a fresh random key of the given type
    pub fn generate(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
                let mut public = [0u8; 33];
                public[0] = ED25519_PREFIX;
                public[1..].copy_from_slice(signing_key.verifying_key().as_bytes());
                Self {
                    key_type,
                    scalar: signing_key.to_bytes(),
                    public,
                }
            }
            KeyType::Secp256k1 => {
                let signing_key = k256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
                let mut scalar = [0u8; 32];
                scalar.copy_from_slice(&signing_key.to_bytes());
                let mut public = [0u8; 33];
                public.copy_from_slice(signing_key.verifying_key().to_encoded_point(true).as_bytes());
                Self {
                    key_type,
                    scalar,
                    public,
                }
            }
        }
    }

    /// Reconstruct a secret key from its raw scalar
    pub fn from_bytes(key_type: KeyType, scalar: [u8; 32]) -> Result<Self> {
        let public = match key_type {
            KeyType::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&scalar);
                let mut public = [0u8; 33];
                public[0] = ED25519_PREFIX;
                public[1..].copy_from_slice(signing_key.verifying_key().as_bytes());
                public
            }
            KeyType::Secp256k1 => {
                let signing_key = k256::ecdsa::SigningKey::from_slice(&scalar)
                    .map_err(|e| CoreError::Crypto(format!("Invalid secp256k1 scalar: {}", e)))?;
                let mut public = [0u8; 33];
                public.copy_from_slice(signing_key.verifying_key().to_encoded_point(true).as_bytes());
                public
            }
        };
        Ok(Self {
            key_type,
            scalar,
            public,
        })
    }

    /// Algorithm of this key
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Public half of this key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.public)
    }

    /// Sign `message`, producing an algorithm-appropriate signature
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match self.key_type {
            KeyType::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&self.scalar);
                Ok(signing_key.sign(message).to_bytes().to_vec())
            }
            KeyType::Secp256k1 => {
                let signing_key = k256::ecdsa::SigningKey::from_slice(&self.scalar)
                    .map_err(|e| CoreError::Crypto(format!("Invalid secp256k1 scalar: {}", e)))?;
                let sig: k256::ecdsa::Signature = signing_key.sign(message);
                Ok(sig.to_bytes().to_vec())
            }
        }
    }
}
