use reqwest::Url;

use crate::error::ProviderError;

/// The origin this server answers for, plus the path its resources live
/// under.
///
/// A URI is local only when scheme, host and port all match and its path
/// segments start with the base path's segments.
#[derive(Debug, Clone)]
pub struct LocalAuthority {
    base: Url,
}

impl LocalAuthority {
    /// Parse `base_url`. It must be an absolute URL with a host.
    pub fn parse(base_url: &str) -> Result<Self, ProviderError> {
        let base = Url::parse(base_url)
            .map_err(|e| ProviderError::Configuration(format!("invalid base url {base_url}: {e}")))?;
        if base.host_str().is_none() {
            return Err(ProviderError::Configuration(format!(
                "base url {base_url} has no host"
            )));
        }
        Ok(Self { base })
    }

    pub fn as_str(&self) -> &str {
        self.base.as_str()
    }

    /// Whether `uri` is served by this authority. Unparseable URIs are not.
    pub fn contains(&self, uri: &str) -> bool {
        let Ok(url) = Url::parse(uri) else {
            return false;
        };
        if url.scheme() != self.base.scheme()
            || url.host_str() != self.base.host_str()
            || url.port_or_known_default() != self.base.port_or_known_default()
        {
            return false;
        }

        let base = segments(&self.base);
        let path = segments(&url);
        path.len() >= base.len() && base.iter().zip(&path).all(|(a, b)| a == b)
    }
}

fn segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_origin_is_local() {
        let local = LocalAuthority::parse("https://pod.example").unwrap();
        assert!(local.contains("https://pod.example/alice/inbox"));
        assert!(local.contains("https://pod.example"));
        assert!(local.contains("https://POD.example/alice"));
        assert!(local.contains("https://pod.example:443/alice"));
    }

    #[test]
    fn lookalike_hosts_are_remote() {
        let local = LocalAuthority::parse("https://pod.example").unwrap();
        assert!(!local.contains("https://pod.example.attacker.net/a"));
        assert!(!local.contains("https://pod.examplex/a"));
        assert!(!local.contains("https://pod.example@attacker.net/a"));
    }

    #[test]
    fn scheme_and_port_must_match() {
        let local = LocalAuthority::parse("https://pod.example").unwrap();
        assert!(!local.contains("http://pod.example/alice"));
        assert!(!local.contains("https://pod.example:8443/alice"));
    }

    #[test]
    fn base_path_is_matched_by_segment() {
        let local = LocalAuthority::parse("https://host.example/pods/").unwrap();
        assert!(local.contains("https://host.example/pods/alice"));
        assert!(local.contains("https://host.example/pods"));
        assert!(!local.contains("https://host.example/podsevil/alice"));
        assert!(!local.contains("https://host.example/other"));
    }

    #[test]
    fn trailing_slash_on_base_is_irrelevant() {
        let with = LocalAuthority::parse("https://pod.example/").unwrap();
        let without = LocalAuthority::parse("https://pod.example").unwrap();
        for uri in ["https://pod.example/alice", "https://pod.example.attacker.net/a"] {
            assert_eq!(with.contains(uri), without.contains(uri));
        }
    }

    #[test]
    fn unparseable_uris_are_remote() {
        let local = LocalAuthority::parse("https://pod.example").unwrap();
        assert!(!local.contains("pod.example/alice"));
        assert!(!local.contains(""));
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(matches!(
            LocalAuthority::parse("not a url"),
            Err(ProviderError::Configuration(_))
        ));
        assert!(LocalAuthority::parse("mailto:ops@pod.example").is_err());
    }
}
