//! Content-addressed request identity keys.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request identity.
///
/// The method is upper-cased so `get` and `GET` address the same entry.
pub fn request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = request_key("GET", "http://localhost:8080/index.html");
        let key2 = request_key("GET", "http://localhost:8080/index.html");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_case() {
        assert_eq!(request_key("get", "https://example.com/"), request_key("GET", "https://example.com/"));
    }

    #[test]
    fn test_key_different_url() {
        assert_ne!(request_key("GET", "https://example.com/a"), request_key("GET", "https://example.com/b"));
    }

    #[test]
    fn test_key_format() {
        let key = request_key("GET", "https://example.com");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
