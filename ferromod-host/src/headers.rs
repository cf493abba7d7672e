//! Byte-keyed access to `http::HeaderMap`
//!
//! Modules address headers by raw bytes. Names are matched case-insensitively
//! and stored lower-case. Names or values the map cannot represent are treated
//! as absent on read and ignored on write.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

pub trait HeaderMapExt {
    /// Number of values stored under `name`.
    fn value_count(&self, name: &[u8]) -> usize;

    /// The `n`-th value under `name`, in insertion order.
    fn nth_value(&self, name: &[u8], n: usize) -> Option<&[u8]>;

    /// Replace every value under `name` with a single copy of `value`.
    fn replace_value(&mut self, name: &[u8], value: &[u8]);

    /// Remove every value under `name`.
    fn remove_all(&mut self, name: &[u8]);
}

impl HeaderMapExt for HeaderMap {
    fn value_count(&self, name: &[u8]) -> usize {
        match HeaderName::from_bytes(name) {
            Ok(name) => self.get_all(&name).iter().count(),
            Err(_) => 0,
        }
    }

    fn nth_value(&self, name: &[u8], n: usize) -> Option<&[u8]> {
        let name = HeaderName::from_bytes(name).ok()?;
        self.get_all(&name)
            .iter()
            .nth(n)
            .map(HeaderValue::as_bytes)
    }

    fn replace_value(&mut self, name: &[u8], value: &[u8]) {
        let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name), HeaderValue::from_bytes(value))
        else {
            tracing::debug!(
                name = %String::from_utf8_lossy(name),
                "Ignoring unrepresentable header"
            );
            return;
        };
        self.insert(name, value);
    }

    fn remove_all(&mut self, name: &[u8]) {
        if let Ok(name) = HeaderName::from_bytes(name) {
            self.remove(&name);
        }
    }
}
