use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Lower bound on the randomness of any issued token, in bytes.
pub const MIN_TOKEN_BYTES: usize = 32;

/// Generates an opaque token from the operating system CSPRNG.
///
/// At least [`MIN_TOKEN_BYTES`] random bytes are drawn whatever `byte_len` says.
/// The result is base64url without padding, so it is safe in cookies, headers and
/// URLs. An unavailable entropy source panics: there is nothing sensible to issue
/// instead.
pub fn generate_token(byte_len: usize) -> String {
    let mut buf = vec![0u8; byte_len.max(MIN_TOKEN_BYTES)];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Compares a presented token against the stored one.
///
/// An empty presented token, or a missing/empty stored token, never matches: two
/// logged-out parties must not authenticate each other. The comparison itself runs
/// in constant time for equal-length inputs.
pub fn tokens_match(presented: &str, stored: Option<&str>) -> bool {
    let stored = match stored {
        Some(stored) if !stored.is_empty() => stored,
        _ => return false,
    };
    if presented.is_empty() || presented.len() != stored.len() {
        return false;
    }
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// The credential pair bound to a principal by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// Returned to the client through the cookie channel.
    pub session: String,
    /// Returned in the login body and echoed back in the `X-CSRF-Token` header.
    pub csrf: String,
}

impl SessionTokens {
    /// Draws two independent tokens.
    pub fn issue(byte_len: usize) -> Self {
        Self {
            session: generate_token(byte_len),
            csrf: generate_token(byte_len),
        }
    }
}
