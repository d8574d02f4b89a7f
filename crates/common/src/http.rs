//! URL helpers for OpenAI-compatible HTTP backends.

fn has_version_suffix(base_url: &str) -> bool {
    let Some(last_segment) = base_url.rsplit('/').next() else {
        return false;
    };
    let Some(rest) = last_segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

/// Resolve `resource` (e.g. `embeddings`, `chat/completions`) against a base
/// URL that may be a bare host, a versioned prefix, or already the full
/// endpoint.
pub fn api_endpoint(base_url: &str, resource: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with(&format!("/{resource}")) {
        return base.to_string();
    }
    if has_version_suffix(base) {
        return format!("{base}/{resource}");
    }
    format!("{base}/v1/{resource}")
}
