//! Password hashing and bearer tokens.
//!
//! Passwords: `HMAC-SHA256(salt, password)` iterated, stored as
//! `<rounds>$<salt hex>$<digest hex>`.
//!
//! Tokens: `<base64url(claims json)>.<base64url(HMAC-SHA256(secret, payload))>`.
//! Claims carry the user id, email, role and an expiry.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::model::Role;

type HmacSha256 = Hmac<Sha256>;

const HASH_ROUNDS: u32 = 4_096;
const SALT_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("signing failed: {0}")]
    Signing(String),
}

fn mac(key: &[u8]) -> Result<HmacSha256, String> {
    <HmacSha256 as Mac>::new_from_slice(key).map_err(|e| format!("HMAC error: {}", e))
}

fn digest(salt: &[u8], password: &str, rounds: u32) -> Result<Vec<u8>, String> {
    let mut out = password.as_bytes().to_vec();
    for _ in 0..rounds {
        let mut m = mac(salt)?;
        m.update(&out);
        out = m.finalize().into_bytes().to_vec();
    }
    Ok(out)
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = digest(&salt, password, HASH_ROUNDS)?;
    Ok(format!("{}${}${}", HASH_ROUNDS, hex::encode(salt), hex::encode(hash)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(rounds), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let (Ok(rounds), Ok(salt), Ok(expected)) = (rounds.parse::<u32>(), hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    match digest(&salt, password, rounds) {
        Ok(actual) => constant_time_eq(&actual, &expected),
        Err(_) => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: Role,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self { secret: secret.as_bytes().to_vec(), ttl_secs }
    }

    pub fn issue(&self, user_id: i64, email: &str, role: Role, now: i64) -> Result<String, TokenError> {
        let claims = Claims { sub: user_id, email: email.to_string(), role, exp: now + self.ttl_secs };
        let raw = serde_json::to_vec(&claims).map_err(|e| TokenError::Signing(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(raw);
        let mut m = mac(&self.secret).map_err(TokenError::Signing)?;
        m.update(payload.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(m.finalize().into_bytes());
        Ok(format!("{}.{}", payload, sig))
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let (payload, sig) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let sig = URL_SAFE_NO_PAD.decode(sig).map_err(|_| TokenError::Malformed)?;
        let mut m = mac(&self.secret).map_err(TokenError::Signing)?;
        m.update(payload.as_bytes());
        m.verify_slice(&sig).map_err(|_| TokenError::BadSignature)?;

        let raw = URL_SAFE_NO_PAD.decode(payload).map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
