//! secp256k1 ECDSA over precomputed digests
//!
//! Signatures travel DER-encoded. Signing is RFC 6979 deterministic and
//! always yields low-S; verification accepts high-S by normalizing first.

use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{Message, PublicKey, SecretKey};

use super::{secp, CryptoError};

/// Parse a 33-byte compressed or 65-byte uncompressed public key
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    if bytes.len() != 33 && bytes.len() != 65 {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected 33 or 65 byte key, got {} bytes",
            bytes.len()
        )));
    }
    PublicKey::from_slice(bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Sign a 32-byte digest, returning the DER encoding (without a sighash byte)
pub fn sign_ecdsa_der(digest: &[u8; 32], secret_key: &SecretKey) -> Vec<u8> {
    let msg = Message::from_digest(*digest);
    secp().sign_ecdsa(&msg, secret_key).serialize_der().to_vec()
}

/// Verify a strict-DER signature over a 32-byte digest
pub fn verify_ecdsa_der(digest: &[u8; 32], der: &[u8], public_key: &PublicKey) -> bool {
    verify_and_normalize(digest, der, public_key).is_some()
}

/// Verify a strict-DER signature and return its low-S DER encoding
pub fn verify_and_normalize(digest: &[u8; 32], der: &[u8], public_key: &PublicKey) -> Option<Vec<u8>> {
    let mut sig = Signature::from_der(der).ok()?;
    sig.normalize_s();
    let msg = Message::from_digest(*digest);
    secp().verify_ecdsa(&msg, &sig, public_key).ok()?;
    Some(sig.serialize_der().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(hex_str: &str) -> [u8; 32] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_rfc6979_signature_is_deterministic() {
        let sk = SecretKey::from_slice(&[0x78; 32]).unwrap();
        let sighash = digest("505f527f00e15fcc5a2d2416c9970beb57dfdfaca99e572a01f143b24dd8fab6");
        let sig = sign_ecdsa_der(&sighash, &sk);
        assert_eq!(
            hex::encode(&sig),
            "3044022041294880caa09bb1b653775310fcdd1458da6b8e7d7fae34e37966414fe115820220646397c9d2513edc5974ecc336e9b287de0cdf071c366f3b3dc3ff309213e4e4"
        );
    }

    #[test]
    fn test_verify() {
        let sk = SecretKey::from_slice(&[0x46; 32]).unwrap();
        let pk = PublicKey::from_secret_key(secp(), &sk);
        let sighash = [0x01u8; 32];
        let sig = sign_ecdsa_der(&sighash, &sk);

        assert!(verify_ecdsa_der(&sighash, &sig, &pk));
        assert!(!verify_ecdsa_der(&[0x02; 32], &sig, &pk));
        assert!(!verify_ecdsa_der(&sighash, &sig[..sig.len() - 1], &pk));
    }

    #[test]
    fn test_high_s_is_normalized() {
        let sk = SecretKey::from_slice(&[0x46; 32]).unwrap();
        let pk = PublicKey::from_secret_key(secp(), &sk);
        let sighash = [0x05u8; 32];
        let low = Signature::from_der(&sign_ecdsa_der(&sighash, &sk)).unwrap();

        // s' = n - s
        let compact = low.serialize_compact();
        let order = bitcoin::secp256k1::constants::CURVE_ORDER;
        let mut high_s = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let diff = order[i] as i16 - compact[32 + i] as i16 - borrow;
            high_s[i] = diff.rem_euclid(256) as u8;
            borrow = if diff < 0 { 1 } else { 0 };
        }
        let mut high = [0u8; 64];
        high[..32].copy_from_slice(&compact[..32]);
        high[32..].copy_from_slice(&high_s);
        let high_der = Signature::from_compact(&high).unwrap().serialize_der().to_vec();

        let normalized = verify_and_normalize(&sighash, &high_der, &pk).unwrap();
        assert_eq!(normalized, low.serialize_der().to_vec());
    }

    #[test]
    fn test_parse_public_key_lengths() {
        let compressed = hex::decode("0217142f69535e4dad0dc7060df645c55a174cc1bfa5b9eb2e59aad2ae96072dfc").unwrap();
        assert!(parse_public_key(&compressed).is_ok());
        assert!(parse_public_key(&compressed[1..]).is_err());
    }
}
