/// One-way hashing of contact fields before they leave the relay
///
/// The conversions API matches users on hashed identifiers only. Fields are
/// normalized first (the API hashes its own records the same way), then run
/// through a `HashPolicy`. The default policy is SHA-256 rendered as
/// lowercase hex, which is what the Meta Conversions API requires.
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use sha2::{Digest, Sha256};

/// Fixed-output one-way hash applied to normalized PII.
pub trait HashPolicy: Send + Sync {
    fn hash(&self, normalized: &str) -> String;
}

/// SHA-256, lowercase hex
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hex;

impl HashPolicy for Sha256Hex {
    fn hash(&self, normalized: &str) -> String {
        hex::encode(Sha256::digest(normalized.as_bytes()))
    }
}

/// Trims and lowercases; `None` when blank.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        None
    } else {
        Some(email)
    }
}

/// Digits with country code, no `+`: "(11) 98765-4321" -> "5511987654321".
///
/// Parsed as a Brazilian number first; numbers the parser rejects fall back to
/// their plain digits so a lead is never dropped for formatting. `None` when
/// there are no digits at all.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let plain: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if plain.is_empty() {
        return None;
    }

    match phonenumber::parse(Some(CountryId::BR), raw.trim()) {
        Ok(number) if phonenumber::is_valid(&number) => {
            let e164 = number.format().mode(Mode::E164).to_string();
            Some(e164.trim_start_matches('+').to_string())
        }
        _ => {
            tracing::debug!("Phone did not parse as BR number, hashing plain digits");
            Some(plain)
        }
    }
}

/// Normalized + hashed email, `None` when absent.
pub fn hash_email(policy: &dyn HashPolicy, raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize_email).map(|e| policy.hash(&e))
}

/// Normalized + hashed phone, `None` when absent.
pub fn hash_phone(policy: &dyn HashPolicy, raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize_phone).map(|p| policy.hash(&p))
}
