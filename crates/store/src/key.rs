use std::fmt;

/// A backend-assigned identifier for one child of the replicated collection.
///
/// Keys are globally unique tokens minted by the store (see
/// [`RealtimeStore::push_key`](crate::RealtimeStore::push_key)). Consumers
/// must treat them as uninterpreted: compared, hashed, displayed for logs,
/// nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PushKey(String);

impl PushKey {
    /// Wraps a raw key string handed out by a store implementation.
    ///
    /// Only store implementations should call this; application code never
    /// builds keys of its own.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PushKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_content() {
        let a = PushKey::from_raw("abc");
        let b = PushKey::from_raw("abc");
        let c = PushKey::from_raw("abd");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
        assert_eq!(a.to_string(), "abc");
    }
}
