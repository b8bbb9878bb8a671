//! Credential resolution for the artifact repository service
//!
//! The auth token comes from the explicit CLI flag when given, otherwise
//! from an ordered list of conventional environment variables. The endpoint
//! override is carried as explicit configuration and exported only into the
//! client child process environment, never into this process.

/// Environment variables consulted for an auth token, in precedence order
pub const TOKEN_ENV_VARS: &[&str] = &["HF_TOKEN", "HUGGINGFACEHUB_API_TOKEN"];

/// Environment variable the external client reads for an endpoint override
pub const ENDPOINT_ENV_VAR: &str = "HF_ENDPOINT";

/// Resolve the auth token to forward to the artifact client
///
/// An explicit non-empty token wins; otherwise the variables in
/// [`TOKEN_ENV_VARS`] are consulted in order and the first non-empty value
/// is used. Returns `None` when nothing resolves (public repositories
/// only).
#[must_use]
pub fn resolve_token(explicit: Option<&str>) -> Option<String> {
    if let Some(token) = explicit
        && !token.is_empty()
    {
        return Some(token.to_string());
    }

    TOKEN_ENV_VARS.iter().find_map(|var| {
        std::env::var(var)
            .ok()
            .filter(|value| !value.is_empty())
    })
}
