//! Base58-check encoding of node public key tokens
//!
//! Tokens are `base58(prefix || key || checksum)` where the checksum is the
//! first four bytes of a double SHA256 over the prefix and key bytes.

use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::keys::PublicKey;

/// Base58 alphabet
const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Token type prefix for node public keys
pub const TOKEN_NODE_PUBLIC: u8 = 28;

const KEY_LEN: usize = 33;
const CHECKSUM_LEN: usize = 4;

/// Encode a public key as a node-public token
pub fn encode_node_public(key: &PublicKey) -> String {
    let mut payload = Vec::with_capacity(1 + KEY_LEN + CHECKSUM_LEN);
    payload.push(TOKEN_NODE_PUBLIC);
    payload.extend_from_slice(key.as_bytes());
    let check = checksum(&payload);
    payload.extend_from_slice(&check);
    bs58_encode(&payload)
}

/// Decode a node-public token back into a public key
pub fn decode_node_public(token: &str) -> Result<PublicKey> {
    let payload = bs58_decode(token)?;
    if payload.len() != 1 + KEY_LEN + CHECKSUM_LEN {
        return Err(CoreError::Base58(format!(
            "Unexpected token length: {}",
            payload.len()
        )));
    }

    let (body, check) = payload.split_at(payload.len() - CHECKSUM_LEN);
    if check != checksum(body).as_slice() {
        return Err(CoreError::Base58("Checksum mismatch".to_string()));
    }
    if body[0] != TOKEN_NODE_PUBLIC {
        return Err(CoreError::Base58(format!(
            "Unexpected token type: {}",
            body[0]
        )));
    }

    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&body[1..]);
    PublicKey::from_bytes(bytes)
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut check = [0u8; CHECKSUM_LEN];
    check.copy_from_slice(&second[..CHECKSUM_LEN]);
    check
}

fn bs58_encode(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }

    // Count leading zeros
    let zeros = data.iter().take_while(|&&x| x == 0).count();

    // Convert to base58
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);

    for &byte in data.iter() {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) * 256;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    // Add leading '1's for leading zeros
    let mut result = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        result.push('1');
    }

    // Convert digits to characters (reverse order)
    for &digit in digits.iter().rev() {
        result.push(ALPHABET[digit as usize] as char);
    }

    result
}

fn bs58_decode(token: &str) -> Result<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::with_capacity(token.len());

    for ch in token.bytes() {
        let digit = ALPHABET
            .iter()
            .position(|&a| a == ch)
            .ok_or_else(|| CoreError::Base58(format!("Invalid base58 character: {}", ch as char)))?
            as u32;

        let mut carry = digit;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    // Leading '1's encode leading zero bytes
    for ch in token.bytes() {
        if ch != b'1' {
            break;
        }
        bytes.push(0);
    }

    bytes.reverse();
    Ok(bytes)
}
