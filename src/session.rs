use rand::Rng;
use serde::Serialize;

/// Lower bound (inclusive) of the random part of a session id
const SESSION_RANGE_START: i64 = 8_300_000;
/// Upper bound (exclusive) of the random part of a session id
const SESSION_RANGE_END: i64 = 8_399_999;

/// Process-wide identifier attached to every successful translation.
///
/// Generated once at startup and never changed afterwards. It only mimics an
/// upstream trace id and carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionId(i64);

impl SessionId {
    /// Draw a fresh identifier from the thread-local RNG
    pub fn generate() -> Self {
        let base = rand::thread_rng().gen_range(SESSION_RANGE_START..SESSION_RANGE_END);
        Self(base * 1000)
    }

    pub fn from_raw(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
