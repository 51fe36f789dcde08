//! DPoP (proof-of-possession) proofs.
//!
//! A session owns one ephemeral P-256 key. Every request gets its own proof:
//! a compact JWS signed with ES256 whose header carries the public key and
//! whose claims bind it to the request method, the request URL and the
//! current time.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use podchat_core::{PodError, Result};
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair, KeyPair};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Public half of the key, as a JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProofHeader {
    pub alg: String,
    pub typ: String,
    pub jwk: Jwk,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProofClaims {
    pub htm: String,
    pub htu: String,
    pub iat: i64,
    pub jti: String,
}

/// An ephemeral signing key.
pub struct DpopKey {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
    jwk: Jwk,
}

impl std::fmt::Debug for DpopKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DpopKey").field("jwk", &self.jwk).finish()
    }
}

impl DpopKey {
    /// Generates a fresh P-256 key pair.
    pub fn generate() -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .map_err(|_| PodError::auth("Failed to generate DPoP key"))?;
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .map_err(|e| PodError::auth(format!("Failed to load DPoP key: {e}")))?;

        // Uncompressed SEC1 point: 0x04 || x || y
        let point = key_pair.public_key().as_ref();
        if point.len() != 65 || point[0] != 0x04 {
            return Err(PodError::auth("Unexpected P-256 public key encoding"));
        }
        let jwk = Jwk {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: URL_SAFE_NO_PAD.encode(&point[1..33]),
            y: URL_SAFE_NO_PAD.encode(&point[33..65]),
        };

        Ok(Self { key_pair, rng, jwk })
    }

    pub fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// Mints a proof for `method url`. Never cache the result: each request
    /// needs a proof with its own `jti`.
    pub fn proof(&self, method: &str, url: &str) -> Result<String> {
        let header = ProofHeader {
            alg: "ES256".to_string(),
            typ: "dpop+jwt".to_string(),
            jwk: self.jwk.clone(),
        };
        let claims = ProofClaims {
            htm: method.to_ascii_uppercase(),
            htu: htu(url)?,
            iat: chrono::Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = self
            .key_pair
            .sign(&self.rng, signing_input.as_bytes())
            .map_err(|_| PodError::auth("Failed to sign DPoP proof"))?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        ))
    }
}

/// The `htu` claim: the request URL without query and fragment.
pub fn htu(url: &str) -> Result<String> {
    let mut parsed =
        Url::parse(url).map_err(|e| PodError::transport(format!("Invalid URL {url}: {e}")))?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::{ECDSA_P256_SHA256_FIXED, UnparsedPublicKey};

    fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> T {
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_proof_verifies_against_embedded_jwk() {
        let key = DpopKey::generate().unwrap();
        let proof = key
            .proof("get", "https://pod.example/alice/private/chatdocs.ttl?x=1#frag")
            .unwrap();

        let parts: Vec<&str> = proof.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: ProofHeader = decode_segment(parts[0]);
        assert_eq!(header.alg, "ES256");
        assert_eq!(header.typ, "dpop+jwt");
        assert_eq!(&header.jwk, key.jwk());

        let claims: ProofClaims = decode_segment(parts[1]);
        assert_eq!(claims.htm, "GET");
        assert_eq!(claims.htu, "https://pod.example/alice/private/chatdocs.ttl");
        assert!((chrono::Utc::now().timestamp() - claims.iat).abs() < 60);

        let mut point = vec![0x04];
        point.extend(URL_SAFE_NO_PAD.decode(&header.jwk.x).unwrap());
        point.extend(URL_SAFE_NO_PAD.decode(&header.jwk.y).unwrap());
        let signature = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        let signing_input = format!("{}.{}", parts[0], parts[1]);
        UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, &point)
            .verify(signing_input.as_bytes(), &signature)
            .expect("proof signature should verify");
    }

    #[test]
    fn test_proofs_are_unique_per_request() {
        let key = DpopKey::generate().unwrap();
        let a = key.proof("PATCH", "https://pod.example/doc").unwrap();
        let b = key.proof("PATCH", "https://pod.example/doc").unwrap();
        assert_ne!(a, b);

        let jti = |proof: &str| decode_segment::<ProofClaims>(proof.split('.').nth(1).unwrap()).jti;
        assert_ne!(jti(&a), jti(&b));
    }

    #[test]
    fn test_keys_differ_per_session() {
        let a = DpopKey::generate().unwrap();
        let b = DpopKey::generate().unwrap();
        assert_ne!(a.jwk(), b.jwk());
    }

    #[test]
    fn test_htu_rejects_invalid_url() {
        assert!(htu("not a url").is_err());
        assert_eq!(htu("http://localhost:3000/a/?q").unwrap(), "http://localhost:3000/a/");
    }
}
