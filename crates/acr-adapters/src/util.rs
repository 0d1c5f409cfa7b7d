//! Small shared helpers used by both the process runner and the diff
//! provider.

/// `true` when a 7-40 character hex string that reads as a commit SHA.
pub fn looks_like_hex_sha(s: &str) -> bool {
    (7..=40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}
