/// Get environment variable with TIDESTORE_ prefix, falling back to unprefixed version
///
/// This helper function checks for `TIDESTORE_{key}` first, then falls back to `{key}`
/// for compatibility with standard environment variable naming.
///
/// # Examples
///
/// ```rust
/// use tidestore::utils::get_env_with_prefix;
///
/// // Checks TIDESTORE_SESSION_EXPIRE_SECONDS first, then SESSION_EXPIRE_SECONDS
/// let expiry = get_env_with_prefix("SESSION_EXPIRE_SECONDS");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("TIDESTORE_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}
