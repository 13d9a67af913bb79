use regex::Regex;
use std::sync::OnceLock;

/// Redacts API keys and bearer tokens from error text and session logs while
/// keeping the surrounding message readable.
pub fn redact_sensitive_text(input: &str) -> String {
    static AUTH_BEARER_RE: OnceLock<Regex> = OnceLock::new();
    static HEADER_KEY_RE: OnceLock<Regex> = OnceLock::new();
    static QUERY_KEY_RE: OnceLock<Regex> = OnceLock::new();
    static GOOGLE_KEY_RE: OnceLock<Regex> = OnceLock::new();
    static KEY_LIKE_RE: OnceLock<Regex> = OnceLock::new();

    let auth_bearer_re = AUTH_BEARER_RE.get_or_init(|| {
        Regex::new(r#"(?i)(authorization\s*:\s*bearer\s+)([A-Za-z0-9._~+/=-]+)"#).unwrap()
    });
    let header_key_re = HEADER_KEY_RE.get_or_init(|| {
        Regex::new(r#"(?i)((?:x-goog-api-key|x-api-key)\s*:\s*)([A-Za-z0-9._~+/=-]+)"#).unwrap()
    });
    let query_key_re = QUERY_KEY_RE.get_or_init(|| {
        Regex::new(r#"(?i)([?&](?:key|api_key|apikey|access_token|token)=)([^&\s"']+)"#).unwrap()
    });
    let google_key_re =
        GOOGLE_KEY_RE.get_or_init(|| Regex::new(r#"\bAIza[0-9A-Za-z_-]{20,}"#).unwrap());
    let key_like_re =
        KEY_LIKE_RE.get_or_init(|| Regex::new(r#"(?i)\b(?:sk|gsk)-[A-Za-z0-9_-]{12,}\b"#).unwrap());

    let step1 = auth_bearer_re
        .replace_all(input, "$1[REDACTED]")
        .to_string();
    let step2 = header_key_re.replace_all(&step1, "$1[REDACTED]").to_string();
    let step3 = query_key_re.replace_all(&step2, "$1[REDACTED]").to_string();
    let step4 = google_key_re.replace_all(&step3, "[REDACTED]").to_string();
    key_like_re.replace_all(&step4, "[REDACTED]").to_string()
}
