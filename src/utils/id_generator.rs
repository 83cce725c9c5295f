use super::hash::{digest_base62, HASH_CODE_LENGTH};

/// Derives short-code candidates from URL content.
///
/// The first candidate is the leading `code_length` characters of the URL's
/// base62 digest; each further candidate is one character longer. The same
/// URL always yields the same sequence.
#[derive(Debug, Clone)]
pub struct HashCodeGenerator {
    code_length: usize,
    max_attempts: usize,
}

impl HashCodeGenerator {
    pub fn new(code_length: usize, max_attempts: usize) -> Self {
        Self {
            code_length: code_length.clamp(1, HASH_CODE_LENGTH),
            max_attempts,
        }
    }

    /// Candidate codes for `url`, shortest first.
    ///
    /// Yields at most `max_attempts` codes and never more than the digest
    /// can provide.
    pub fn candidates(&self, url: &str) -> impl Iterator<Item = String> {
        let digest = digest_base62(url);
        let start = self.code_length;
        let end = (start + self.max_attempts).min(HASH_CODE_LENGTH + 1);

        (start..end).map(move |len| digest[..len].to_string())
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
