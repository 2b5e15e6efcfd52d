//! Stable fingerprint of the registration fields, used to skip registrations
//! the server has already accepted.
//!
//! The digest input must stay byte-compatible with fingerprints persisted by
//! earlier installs: 32-bit string hash codes, Latin-1 bytes.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// 32-bit polynomial string hash (`h = 31 * h + unit`) over UTF-16 code units.
pub fn string_hash_code(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Device id rehomed into UUID form, both halves set to its sign extended hash
/// code. An absent device id yields an empty string.
pub fn device_uuid(device_id: Option<&str>) -> String {
    match device_id {
        Some(id) => {
            let h = string_hash_code(id) as i64 as u64;
            Uuid::from_u64_pair(h, h).hyphenated().to_string()
        }
        None => String::new(),
    }
}

/// Latin-1 encoding, every character outside it becomes `?`.
fn iso_8859_1(s: &str) -> Vec<u8> {
    s.chars().map(|c| if (c as u32) < 256 { c as u32 as u8 } else { b'?' }).collect()
}

/// Lowercase hex SHA-256 of `token + user_key + hash(serialized_params) + device_uuid`.
pub fn compute_fingerprint(token: &str, user_key: &str, serialized_params: &str, device_uuid: &str) -> String {
    let input = format!("{}{}{}{}", token, user_key, string_hash_code(serialized_params), device_uuid);
    hex::encode(Sha256::digest(iso_8859_1(&input)))
}

/// A missing fingerprint on either side always counts as a change.
#[inline]
pub fn has_changed(new: Option<&str>, stored: Option<&str>) -> bool {
    match (new, stored) {
        (Some(new), Some(stored)) => new != stored,
        _ => true,
    }
}

#[cfg(test)]
pub(crate) const PERSISTED_FINGERPRINT: &str = "b1315b4b0514a6092451017162124d59dea702370eed96077e3d524fe6ce899d";
