/// Field validators and input masks for the lead form
///
/// Everything here is pure: no I/O, no shared state, no panics on any input.
/// Covered fields:
/// 1. CNPJ (business registration number): mask + mod-11 check digits
/// 2. Brazilian phone (landline or mobile): mask + structural checks
/// 3. E-mail: syntactic check, optionally required
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// local-part "@" domain "." tld (2+ chars)
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").unwrap();
}

const CNPJ_LEN: usize = 14;
const CNPJ_WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

const PHONE_MAX_LEN: usize = 11;

/// Keeps only ASCII digits: "(11) 98765-4321" -> "11987654321"
pub fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True for two or more repetitions of the same digit ("0000", "99")
pub fn all_same(digits: &str) -> bool {
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) if first.is_ascii_digit() && digits.len() > 1 => chars.all(|c| c == first),
        _ => false,
    }
}

/// Formats a CNPJ progressively as it is typed: `11.222.333/0001-81`.
///
/// Non-digits are dropped and input is truncated to 14 digits. Partial input
/// yields partial formatting, never padding.
pub fn mask_business_id(raw: &str) -> String {
    let d: Vec<char> = digits(raw).chars().take(CNPJ_LEN).collect();
    let mut out = String::with_capacity(18);

    for (i, c) in d.iter().enumerate() {
        match i {
            2 | 5 => out.push('.'),
            8 => out.push('/'),
            12 => out.push('-'),
            _ => {}
        }
        out.push(*c);
    }

    out
}

/// Validates a CNPJ (formatted or not) by its two weighted mod-11 check digits.
pub fn is_valid_business_id(raw: &str) -> bool {
    let d: Vec<u32> = digits(raw).chars().filter_map(|c| c.to_digit(10)).collect();

    if d.len() != CNPJ_LEN {
        return false;
    }
    if d.iter().all(|&x| x == d[0]) {
        return false;
    }

    let first = check_digit(&d[..12], &CNPJ_WEIGHTS_FIRST);
    if first != d[12] {
        return false;
    }

    let second = check_digit(&d[..13], &CNPJ_WEIGHTS_SECOND);
    second == d[13]
}

/// `r = sum % 11`; digit is 0 when r < 2, else 11 - r
fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let r = sum % 11;
    if r < 2 {
        0
    } else {
        11 - r
    }
}

/// Formats a Brazilian phone progressively: `(11` → `(11) 9876` →
/// `(11) 9876-5432` (10 digits) → `(11) 98765-4321` (11 digits).
pub fn mask_phone(raw: &str) -> String {
    let d: String = digits(raw).chars().take(PHONE_MAX_LEN).collect();
    let len = d.len();

    match len {
        0 => String::new(),
        1..=2 => format!("({}", d),
        3..=6 => format!("({}) {}", &d[..2], &d[2..]),
        7..=10 => format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..]),
        _ => format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..]),
    }
}

/// Validates a Brazilian phone number (DDD + number).
///
/// - 10 digits: landline, first digit after the DDD in `2..=8`
/// - 11 digits: mobile, first digit after the DDD must be `9`
/// - DDD starts with `1..=9`; repeated-digit sequences are rejected
pub fn is_valid_phone(raw: &str) -> bool {
    let d = digits(raw);

    if d.len() != 10 && d.len() != 11 {
        return false;
    }
    if all_same(&d) {
        return false;
    }

    let bytes = d.as_bytes();
    if !(b'1'..=b'9').contains(&bytes[0]) {
        return false;
    }

    let prefix = bytes[2];
    if d.len() == 11 {
        prefix == b'9'
    } else {
        (b'2'..=b'8').contains(&prefix)
    }
}

/// Validates an e-mail address. Blank input passes only when `required` is false.
pub fn is_valid_email(raw: &str, required: bool) -> bool {
    let s = raw.trim();
    if s.is_empty() {
        return !required;
    }
    EMAIL_PATTERN.is_match(s)
}
