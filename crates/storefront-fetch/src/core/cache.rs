//! Naming of cached copies of remote resources.

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// File name for the cached copy of `url`: `<sha256(url)>-<basename>`.
///
/// The hash keeps resources with the same basename from different servers
/// apart; the basename keeps the cache directory readable.
pub fn cache_basename(url: &str) -> Result<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let basename = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && !name.ends_with(':'))
        .ok_or_else(|| Error::invalid_uri(url, "no file name to cache under"))?;

    Ok(format!("{}-{}", hex::encode(Sha256::digest(url.as_bytes())), basename))
}

/// External AppStream data may only come from HTTPS servers, or over plain
/// HTTP from the local machine.
pub fn is_allowed_appstream_url(url: &str) -> bool {
    url.starts_with("https:")
        || url.starts_with("http://localhost/")
        || url.starts_with("http://localhost:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_is_hash_prefixed() {
        let name = cache_basename("https://example.org/data/apps.xml.gz").unwrap();
        let (hash, basename) = name.split_once('-').unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(basename, "apps.xml.gz");
    }

    #[test]
    fn same_basename_different_servers() {
        let a = cache_basename("https://a.example/apps.xml").unwrap();
        let b = cache_basename("https://b.example/apps.xml").unwrap();
        assert_ne!(a, b);
        assert!(a.ends_with("-apps.xml") && b.ends_with("-apps.xml"));
    }

    #[test]
    fn query_is_not_part_of_basename() {
        let name = cache_basename("https://example.org/img.png?size=64").unwrap();
        assert!(name.ends_with("-img.png"));
    }

    #[test]
    fn rejects_url_without_name() {
        assert!(cache_basename("https://").is_err());
    }

    #[test]
    fn appstream_url_policy() {
        assert!(is_allowed_appstream_url("https://example.org/apps.xml"));
        assert!(is_allowed_appstream_url("http://localhost/apps.xml"));
        assert!(is_allowed_appstream_url("http://localhost:8080/apps.xml"));
        assert!(!is_allowed_appstream_url("http://example.org/apps.xml"));
        assert!(!is_allowed_appstream_url("http://localhost.example.org/apps.xml"));
        assert!(!is_allowed_appstream_url("ftp://example.org/apps.xml"));
    }
}
