//! Signed manifests delegating signing authority
//!
//! A manifest binds a master identity key to an ephemeral operational signing
//! key at a sequence number. The canonical encoding is a fixed-order
//! tag-length layout:
//!
//! ```text
//! TAG         SIZE        FIELD
//! ─────────────────────────────────────────────
//! 0x24        4           sequence (big endian)
//! 0x71        33          master public key
//! 0x73        33          operational signing key
//! 0x76        1 + n       signature (length-prefixed)
//! ```
//!
//! The embedded signature covers a domain-separated digest of every field
//! except the signature itself; the same payload routine is used bit-exactly
//! by the signing path and the verification path.

use crate::error::{CoreError, Result};
use crate::keys::{PublicKey, SecretKey};

/// Domain separation prefix for manifest signatures
pub const MANIFEST_PREFIX: &[u8; 4] = b"MAN\0";

/// Field tag for the sequence number
const FIELD_SEQUENCE: u8 = 0x24;
/// Field tag for the master public key
const FIELD_MASTER_KEY: u8 = 0x71;
/// Field tag for the operational signing key
const FIELD_SIGNING_KEY: u8 = 0x73;
/// Field tag for the embedded signature
const FIELD_SIGNATURE: u8 = 0x76;

const KEY_LEN: usize = 33;

/// Signed credential delegating signing authority from a master key to an
/// operational signing key at a sequence number
#[derive(Debug, Clone)]
pub struct Manifest {
    master_key: PublicKey,
    signing_key: PublicKey,
    sequence: u32,
    serialized: Vec<u8>,
    signature: Vec<u8>,
}

impl Manifest {
    /// Assemble a manifest from already-validated parts.
    ///
    /// No verification happens here; the caller asserts the parts came from
    /// [`Manifest::decode`] or [`Manifest::sign`].
    pub fn new(
        serialized: Vec<u8>,
        master_key: PublicKey,
        signing_key: PublicKey,
        sequence: u32,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            master_key,
            signing_key,
            sequence,
            serialized,
            signature,
        }
    }

    /// Parse the canonical encoding and verify the embedded signature under
    /// the claimed master key.
    ///
    /// Fails on truncated or malformed bytes, unknown field layout, and
    /// signature mismatch; never yields a partially constructed manifest.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (sequence, master_key, signing_key, signature) = decode_fields(bytes)?;
        let manifest = Self {
            master_key,
            signing_key,
            sequence,
            serialized: bytes.to_vec(),
            signature,
        };
        if !manifest.verify() {
            return Err(CoreError::SignatureVerificationFailed);
        }
        Ok(manifest)
    }

    /// Build and sign a manifest under `master_secret`
    pub fn sign(master_secret: &SecretKey, signing_key: &PublicKey, sequence: u32) -> Result<Self> {
        let master_key = master_secret.public_key();
        let payload = signing_payload(&master_key, sequence, signing_key);
        let signature = master_secret.sign(&payload)?;
        let serialized = encode(sequence, &master_key, signing_key, &signature);
        Ok(Self::new(
            serialized,
            master_key,
            *signing_key,
            sequence,
            signature,
        ))
    }

    /// Re-check the embedded signature against the stated fields
    pub fn verify(&self) -> bool {
        let payload = signing_payload(&self.master_key, self.sequence, &self.signing_key);
        self.master_key.verify(&payload, &self.signature).is_ok()
    }

    /// Master identity key
    pub fn master_key(&self) -> &PublicKey {
        &self.master_key
    }

    /// Delegated operational signing key
    pub fn signing_key(&self) -> &PublicKey {
        &self.signing_key
    }

    /// Replay-protection sequence number
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Canonical encoded bytes
    pub fn serialized(&self) -> &[u8] {
        &self.serialized
    }

    /// Raw embedded signature bytes
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.serialized == other.serialized
            && self.master_key == other.master_key
            && self.signing_key == other.signing_key
            && self.sequence == other.sequence
    }
}

impl Eq for Manifest {}

/// Canonical encoding of a full manifest.
///
/// Signature length must fit one byte; both supported algorithms produce
/// 64-byte signatures.
pub fn encode(
    sequence: u32,
    master_key: &PublicKey,
    signing_key: &PublicKey,
    signature: &[u8],
) -> Vec<u8> {
    let mut out = encode_unsigned(sequence, master_key, signing_key);
    out.push(FIELD_SIGNATURE);
    out.push(signature.len() as u8);
    out.extend_from_slice(signature);
    out
}

/// Domain-separated payload covered by the manifest signature
pub fn signing_payload(master_key: &PublicKey, sequence: u32, signing_key: &PublicKey) -> Vec<u8> {
    let mut payload = Vec::with_capacity(MANIFEST_PREFIX.len() + 5 + 2 * (1 + KEY_LEN));
    payload.extend_from_slice(MANIFEST_PREFIX);
    payload.extend_from_slice(&encode_unsigned(sequence, master_key, signing_key));
    payload
}

fn encode_unsigned(sequence: u32, master_key: &PublicKey, signing_key: &PublicKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(5 + 2 * (1 + KEY_LEN));
    out.push(FIELD_SEQUENCE);
    out.extend_from_slice(&sequence.to_be_bytes());
    out.push(FIELD_MASTER_KEY);
    out.extend_from_slice(master_key.as_bytes());
    out.push(FIELD_SIGNING_KEY);
    out.extend_from_slice(signing_key.as_bytes());
    out
}

fn decode_fields(bytes: &[u8]) -> Result<(u32, PublicKey, PublicKey, Vec<u8>)> {
    let mut rest = bytes;

    let sequence_body = take_field(&mut rest, FIELD_SEQUENCE, 4)?;
    let sequence = u32::from_be_bytes(
        sequence_body
            .try_into()
            .map_err(|_| CoreError::Decode("Truncated sequence field".to_string()))?,
    );

    let master_body = take_field(&mut rest, FIELD_MASTER_KEY, KEY_LEN)?;
    let mut master_bytes = [0u8; KEY_LEN];
    master_bytes.copy_from_slice(master_body);
    let master_key = PublicKey::from_bytes(master_bytes)
        .map_err(|e| CoreError::Decode(format!("Bad master key: {}", e)))?;

    let signing_body = take_field(&mut rest, FIELD_SIGNING_KEY, KEY_LEN)?;
    let mut signing_bytes = [0u8; KEY_LEN];
    signing_bytes.copy_from_slice(signing_body);
    let signing_key = PublicKey::from_bytes(signing_bytes)
        .map_err(|e| CoreError::Decode(format!("Bad signing key: {}", e)))?;

    match rest.first() {
        Some(&FIELD_SIGNATURE) => {}
        Some(&tag) => {
            return Err(CoreError::Decode(format!(
                "Unexpected field tag {:#04x}",
                tag
            )))
        }
        None => return Err(CoreError::Decode("Missing signature field".to_string())),
    }
    rest = &rest[1..];

    let sig_len = *rest
        .first()
        .ok_or_else(|| CoreError::Decode("Truncated signature field".to_string()))?
        as usize;
    rest = &rest[1..];
    if rest.len() < sig_len {
        return Err(CoreError::Decode("Truncated signature field".to_string()));
    }
    let signature = rest[..sig_len].to_vec();
    rest = &rest[sig_len..];

    if !rest.is_empty() {
        return Err(CoreError::Decode(
            "Trailing bytes after signature".to_string(),
        ));
    }

    Ok((sequence, master_key, signing_key, signature))
}

fn take_field<'a>(rest: &mut &'a [u8], tag: u8, len: usize) -> Result<&'a [u8]> {
    match rest.first() {
        Some(&t) if t == tag => {}
        Some(&t) => {
            return Err(CoreError::Decode(format!(
                "Unexpected field tag {:#04x}",
                t
            )))
        }
        None => return Err(CoreError::Decode("Truncated manifest".to_string())),
    }
    let body = rest
        .get(1..1 + len)
        .ok_or_else(|| CoreError::Decode("Truncated manifest".to_string()))?;
    *rest = &rest[1 + len..];
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyType, SecretKey};

    fn make_manifest(sequence: u32) -> (SecretKey, Manifest) {
        let master = SecretKey::generate(KeyType::Ed25519);
        let signing = SecretKey::generate(KeyType::Secp256k1).public_key();
        let manifest = Manifest::sign(&master, &signing, sequence).unwrap();
        (master, manifest)
    }

    #[test]
    fn test_sign_decode_roundtrip() {
        let (_, manifest) = make_manifest(7);
        let decoded = Manifest::decode(manifest.serialized()).unwrap();
        assert_eq!(manifest, decoded);
        assert_eq!(decoded.sequence(), 7);
    }

    #[test]
    fn test_decode_trailing_byte_fails() {
        let (_, manifest) = make_manifest(1);
        let mut bytes = manifest.serialized().to_vec();
        bytes.push(0);
        assert!(Manifest::decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_truncated_fails() {
        let (_, manifest) = make_manifest(1);
        let bytes = manifest.serialized();
        for cut in [0, 1, 4, 10, bytes.len() - 1] {
            assert!(Manifest::decode(&bytes[..cut]).is_err());
        }
    }

    #[test]
    fn test_decode_unknown_tag_fails() {
        let (_, manifest) = make_manifest(1);
        let mut bytes = manifest.serialized().to_vec();
        bytes[0] = 0x42;
        assert!(matches!(
            Manifest::decode(&bytes),
            Err(CoreError::Decode(_))
        ));
    }

    #[test]
    fn test_tampered_sequence_fails_decode() {
        let (_, manifest) = make_manifest(3);
        let tampered = encode(
            4,
            manifest.master_key(),
            manifest.signing_key(),
            manifest.signature(),
        );
        assert!(matches!(
            Manifest::decode(&tampered),
            Err(CoreError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_tampered_manifest_fails_verify() {
        let (_, manifest) = make_manifest(3);
        let serialized = encode(
            4,
            manifest.master_key(),
            manifest.signing_key(),
            manifest.signature(),
        );
        let tampered = Manifest::new(
            serialized,
            *manifest.master_key(),
            *manifest.signing_key(),
            4,
            manifest.signature().to_vec(),
        );
        assert!(!tampered.verify());
        assert!(manifest.verify());
    }

    #[test]
    fn test_signing_payload_parity() {
        let (master, manifest) = make_manifest(0);
        let payload = signing_payload(manifest.master_key(), 0, manifest.signing_key());
        let sig = master.sign(&payload).unwrap();
        assert_eq!(hex::encode(&sig), hex::encode(manifest.signature()));
    }

    #[test]
    fn test_equality_is_structural() {
        let (_, manifest) = make_manifest(2);
        let clone = Manifest::new(
            manifest.serialized().to_vec(),
            *manifest.master_key(),
            *manifest.signing_key(),
            manifest.sequence(),
            manifest.signature().to_vec(),
        );
        assert_eq!(manifest, clone);

        let (_, other) = make_manifest(2);
        assert_ne!(manifest, other);
    }
}
