use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

/// Process-unique handle.
///
/// Tokens identify observer registrations and load requests. A token is
/// never reused: two calls to [`TokenGenerator::next_token`] on the same
/// generator never return the same value, from any thread.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(u64);

impl Token {
    /// Draw a fresh token from the process-wide generator.
    pub fn make_unique() -> Self {
        shared().next_token()
    }

    /// The raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Wrap a raw value. Intended for tests and deserialization; tokens
    /// built this way carry no uniqueness guarantee.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tok:{}", self.0)
    }
}

/// Lock-free, monotonically increasing token source.
///
/// Each generator is an independent counter starting at 1. Most code uses the
/// process-wide instance ([`TokenGenerator::global`]); tests and embedders
/// that want deterministic values create their own and hand it to the
/// components that issue tokens.
#[derive(Debug)]
pub struct TokenGenerator {
    next: AtomicU64,
}

impl TokenGenerator {
    /// Create a generator whose first token is `Token(1)`.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// The shared process-wide generator.
    pub fn global() -> Arc<TokenGenerator> {
        Arc::clone(shared())
    }

    /// Issue the next token.
    ///
    /// A single atomic read-modify-write, so concurrent callers always observe
    /// distinct values.
    pub fn next_token(&self) -> Token {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        debug_assert!(raw != u64::MAX, "token space exhausted");
        Token(raw)
    }

    /// Number of tokens issued so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn shared() -> &'static Arc<TokenGenerator> {
    static SHARED: OnceLock<Arc<TokenGenerator>> = OnceLock::new();
    SHARED.get_or_init(|| Arc::new(TokenGenerator::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one_and_increments() {
        let tokens = TokenGenerator::new();
        assert_eq!(tokens.next_token().get(), 1);
        assert_eq!(tokens.next_token().get(), 2);
        assert_eq!(tokens.issued(), 2);
    }

    #[test]
    fn make_unique_is_strictly_increasing() {
        let mut prev = Token::make_unique();
        for _ in 0..1000 {
            let next = Token::make_unique();
            assert!(next > prev, "tokens must increase: {prev:?} >= {next:?}");
            prev = next;
        }
    }

    #[test]
    fn global_generator_is_shared() {
        let a = TokenGenerator::global();
        let b = TokenGenerator::global();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_tokens_are_unique() {
        use std::thread;

        let tokens = Arc::new(TokenGenerator::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let tokens = Arc::clone(&tokens);
            handles.push(thread::spawn(move || {
                (0..500).map(|_| tokens.next_token()).collect::<Vec<_>>()
            }));
        }

        let mut all: Vec<Token> = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }

        let len = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), len, "all tokens must be unique across threads");
        assert_eq!(tokens.issued(), 4000);
    }

    #[test]
    fn display_format() {
        assert_eq!(Token::from_raw(9).to_string(), "tok:9");
    }
}
