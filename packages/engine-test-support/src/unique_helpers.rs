//! Unique player ids so tests sharing a store or a database never collide.

use ulid::Ulid;

/// `{prefix}-{ulid}`, lowercased so ids sort the same way they print.
///
/// ```
/// use engine_test_support::unique_uid;
///
/// let a = unique_uid("alice");
/// assert!(a.starts_with("alice-"));
/// assert_ne!(a, unique_uid("alice"));
/// ```
pub fn unique_uid(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new().to_string().to_lowercase())
}

/// Two distinct ids sharing a ULID suffix, handy for `(inviter, invitee)`.
pub fn unique_pair(first: &str, second: &str) -> (String, String) {
    let suffix = Ulid::new().to_string().to_lowercase();
    (format!("{first}-{suffix}"), format!("{second}-{suffix}"))
}
