use crate::error::PodwatchError;

/// Return the container URI of a resource: the URI with its last path
/// segment removed. A trailing slash is ignored.
///
/// ```
/// use podwatch_core::container_of;
///
/// assert_eq!(container_of("https://pod.example/alice/inbox").unwrap(), "https://pod.example/alice");
/// assert_eq!(container_of("https://pod.example/alice/inbox/").unwrap(), "https://pod.example/alice");
/// ```
pub fn container_of(uri: &str) -> Result<String, PodwatchError> {
    let trimmed = uri.strip_suffix('/').unwrap_or(uri);
    let authority_start = trimmed.find("://").map_or(0, |i| i + 3);

    match trimmed.rfind('/') {
        Some(idx) if idx >= authority_start => Ok(trimmed[..idx].to_owned()),
        _ => Err(PodwatchError::InvalidUri(format!(
            "{uri} has no parent container"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_of_nested_path() {
        assert_eq!(
            container_of("https://pod.example/alice/data/notes/1").unwrap(),
            "https://pod.example/alice/data/notes"
        );
    }

    #[test]
    fn container_of_root_is_invalid() {
        assert!(container_of("https://pod.example").is_err());
        assert!(container_of("https://pod.example/").is_err());
        assert!(container_of("no-slashes").is_err());
    }
}
