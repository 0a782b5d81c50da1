use sha1::{Digest, Sha1};

/// Number of hex characters kept from the SHA1 digest
const FINGERPRINT_LEN: usize = 16;

/// Stable fingerprint of a list of settings values.
///
/// Parts are length-prefixed before hashing so `["ab", "c"]` and `["a", "bc"]`
/// never collide. Secrets can be passed in: only the truncated digest leaves
/// this function.
pub fn fingerprint<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Sha1::new();
    for part in parts {
        let part = part.as_ref();
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}
