//! URL utilities for consistent URL handling
//!
//! Normalizing the base URL prevents double slashes when endpoints are
//! appended, whatever the user put in `OLLAMA_HOST` or the config file.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use ollachat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434");
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and a path, with no
/// double slashes in the result.
///
/// # Examples
///
/// ```
/// use ollachat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434/", "api/tags"),
///     "http://localhost:11434/api/tags"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
