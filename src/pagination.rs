//! Opaque page tokens for list calls.
//!
//! A token is `base64(salt ++ decimal offset)`. The salt is fixed per codec
//! instance so tokens minted by one instance are rejected by another. This is
//! not tamper-proof: anyone can decode a token and mint a new one for the same
//! instance. It only guards against accidental reuse across instances.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tonic::Status;

fn invalid_token(token: &str) -> Status {
    Status::invalid_argument(format!("The field `page_token` is invalid: {token:?}"))
}

#[derive(Debug, Clone)]
pub struct PageTokenCodec {
    salt: String,
}

impl PageTokenCodec {
    /// Codec salted with the current unix time in seconds.
    pub fn new() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self::with_salt(seconds.to_string())
    }

    pub fn with_salt(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Token that resumes listing at `index`.
    pub fn for_index(&self, index: usize) -> String {
        STANDARD.encode(format!("{}{}", self.salt, index))
    }

    /// Offset encoded in `token`; the empty token is offset 0.
    pub fn get_index(&self, token: &str) -> Result<usize, Status> {
        if token.is_empty() {
            return Ok(0);
        }

        let decoded = STANDARD
            .decode(token)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| invalid_token(token))?;

        decoded
            .strip_prefix(self.salt.as_str())
            .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|suffix| suffix.parse::<usize>().ok())
            .ok_or_else(|| invalid_token(token))
    }
}

impl Default for PageTokenCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn empty_token_starts_at_zero() {
        assert_eq!(PageTokenCodec::with_salt("s").get_index("").unwrap(), 0);
    }

    #[test]
    fn decodes_own_tokens() {
        let codec = PageTokenCodec::with_salt("1700000000");
        for index in [0, 1, 9, 10, 4242, usize::MAX] {
            assert_eq!(codec.get_index(&codec.for_index(index)).unwrap(), index);
        }
        let seeded = PageTokenCodec::new();
        assert_eq!(seeded.get_index(&seeded.for_index(17)).unwrap(), 17);
    }

    #[test]
    fn rejects_tokens_from_other_salt() {
        let token = PageTokenCodec::with_salt("alpha").for_index(3);
        let err = PageTokenCodec::with_salt("beta").get_index(&token).unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), format!("The field `page_token` is invalid: {token:?}"));
    }

    #[test]
    fn rejects_malformed_tokens() {
        let codec = PageTokenCodec::with_salt("salt");
        for token in [
            "%%%not-base64%%%".to_string(),
            STANDARD.encode("salt"),
            STANDARD.encode("salt-4"),
            STANDARD.encode("salt4x"),
            STANDARD.encode("other12"),
            STANDARD.encode([0xff, 0xfe]),
        ] {
            let err = codec.get_index(&token).unwrap_err();
            assert_eq!(err.code(), Code::InvalidArgument, "token {token:?}");
            assert!(err.message().contains(token.as_str()), "{}", err.message());
        }
    }
}
