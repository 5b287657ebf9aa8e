//! Waterbody identity handling.
//!
//! Identities are always strings. Vector stores disagree on the attribute
//! that carries them, so ingestion guesses the field from a fixed priority
//! list; stores that expose numeric identities get them normalised to a
//! zero-padded string exactly once, here, so path construction never has to
//! care again.

use std::collections::HashSet;

use orion_error::prelude::*;

use crate::error::{CoreReason, CoreResult};

/// Identity attribute names, in order of preference. Lowercase variants are
/// tried after the exact names.
pub const ID_FIELD_PRIORITY: [&str; 6] = ["UID", "WB_ID", "FID_1", "FID", "ID", "OBJECTID"];

/// Pick the identity field out of a record's attribute names.
pub fn guess_id_field<'a, I>(keys: I) -> CoreResult<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let keys: HashSet<&str> = keys.into_iter().collect();
    for guess in ID_FIELD_PRIORITY {
        if keys.contains(guess) {
            return Ok(guess.to_string());
        }
    }
    for guess in ID_FIELD_PRIORITY {
        let lower = guess.to_ascii_lowercase();
        if keys.contains(lower.as_str()) {
            return Ok(lower);
        }
    }
    StructError::from(CoreReason::DataFormat)
        .with_detail(format!("no identity field among {:?}", keys))
        .err()
}

/// Normalise a raw identity value. Purely numeric identities are zero-padded
/// to six digits (`"7"` and `"007"` both become `"000007"`); everything else
/// passes through trimmed.
pub fn normalize_uid(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = trimmed.parse::<u64>() {
            return format!("{n:06}");
        }
    }
    trimmed.to_string()
}

/// Leading characters of a uid used as its output shard directory, keeping
/// any single directory's file count bounded.
pub fn shard_prefix(uid: &str) -> &str {
    match uid.char_indices().nth(4) {
        Some((ix, _)) => &uid[..ix],
        None => uid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_in_priority_order() {
        let field = guess_id_field(["STATE", "FID", "UID", "area"]).unwrap();
        assert_eq!(field, "UID");
        let field = guess_id_field(["STATE", "OBJECTID", "FID_1"]).unwrap();
        assert_eq!(field, "FID_1");
    }

    #[test]
    fn falls_back_to_lowercase() {
        let field = guess_id_field(["state", "uid"]).unwrap();
        assert_eq!(field, "uid");
    }

    #[test]
    fn unknown_fields_are_an_error() {
        assert!(guess_id_field(["STATE", "area"]).is_err());
    }

    #[test]
    fn numeric_uids_are_zero_padded() {
        assert_eq!(normalize_uid("7"), "000007");
        assert_eq!(normalize_uid("007"), "000007");
        assert_eq!(normalize_uid("1234567"), "1234567");
    }

    #[test]
    fn geohash_uids_pass_through() {
        assert_eq!(normalize_uid("r3dp84s8n"), "r3dp84s8n");
        assert_eq!(normalize_uid("  r3dp84s8n "), "r3dp84s8n");
    }

    #[test]
    fn shard_is_first_four_chars() {
        assert_eq!(shard_prefix("r3dp84s8n"), "r3dp");
        assert_eq!(shard_prefix("ab"), "ab");
    }
}
