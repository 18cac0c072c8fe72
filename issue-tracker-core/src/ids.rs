//! Human-readable issue identifiers: `ISSUE-<YYMMDDHHMMSS>-<XXXX>`.
//!
//! Uniqueness rests on the second-resolution timestamp plus four random
//! uppercase alphanumerics (36^4 combinations per second). Nothing checks
//! the store for collisions.

use chrono::{Local, NaiveDateTime};
use rand::Rng;

pub const ISSUE_PREFIX: &str = "ISSUE";

const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

pub fn generate_short_id(prefix: &str) -> String {
    generate_short_id_at(prefix, Local::now().naive_local(), &mut rand::rng())
}

pub fn generate_short_id_at<R: Rng>(prefix: &str, at: NaiveDateTime, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())]))
        .collect();
    format!("{prefix}-{}-{suffix}", at.format("%y%m%d%H%M%S"))
}

/// Whether `id` has the shape produced by [`generate_short_id`] for `prefix`.
pub fn is_short_id(id: &str, prefix: &str) -> bool {
    let Some(rest) = id.strip_prefix(prefix).and_then(|r| r.strip_prefix('-')) else {
        return false;
    };
    let Some((stamp, suffix)) = rest.split_once('-') else {
        return false;
    };
    stamp.len() == 12
        && stamp.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| SUFFIX_CHARSET.contains(&b))
}
