//! URL canonicalizer. Pure functions normalizing URLs to a canonical form
//! and deciding domain equivalence and "valid internal link".
//! Everything network-facing goes through `sanitize_url` before comparison,
//! storage, or set membership — it is the sole form used everywhere else in
//! the workspace.

use url::Url;

/// Static-resource / fragment-only extensions rejected by the crawl (case
/// as given — matches the source's exact-string `endswith` check).
const STATIC_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "pdf", "xml", "ipynb", "py"];

fn add_https_if_missing(u: &str) -> String {
    let lower = u.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        u.to_string()
    } else {
        format!("https://{u}")
    }
}

/// Netloc as Python's `urlparse(...).netloc` would produce it:
/// `[user[:pass]@]host[:port]`.
fn raw_netloc(u: &str) -> String {
    let with_scheme = add_https_if_missing(u);
    let Ok(parsed) = Url::parse(&with_scheme) else {
        return String::new();
    };
    let host = parsed.host_str().unwrap_or("");
    let username = parsed.username();
    let mut netloc = String::new();
    if !username.is_empty() {
        netloc.push_str(username);
        if let Some(pw) = parsed.password() {
            netloc.push(':');
            netloc.push_str(pw);
        }
        netloc.push('@');
    }
    netloc.push_str(host);
    if let Some(port) = parsed.port() {
        netloc.push(':');
        netloc.push_str(&port.to_string());
    }
    netloc
}

/// Parse `u` (inserting `https://` if it has neither scheme); take the
/// netloc; strip a leading `www.`; if an `@` is present, keep the rightmost
/// part.
pub fn get_domain(u: &str) -> String {
    let mut netloc = raw_netloc(u).to_ascii_lowercase();
    if let Some(stripped) = netloc.strip_prefix("www.") {
        netloc = stripped.to_string();
    }
    if let Some(idx) = netloc.rfind('@') {
        netloc = netloc[idx + 1..].to_string();
    }
    netloc
}

/// Parse path; strip trailing `/`; collapse runs of `/` to one. Query and
/// fragment are dropped.
pub fn get_path(u: &str) -> String {
    let with_scheme = add_https_if_missing(u);
    let Ok(parsed) = Url::parse(&with_scheme) else {
        return String::new();
    };
    let mut path = parsed.path();
    while let Some(stripped) = path.strip_suffix('/') {
        path = stripped;
    }

    let mut collapsed = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                collapsed.push(c);
            }
            prev_slash = true;
        } else {
            collapsed.push(c);
            prev_slash = false;
        }
    }
    collapsed
}

/// `https:// + get_domain(u) + get_path(u)`, then strip a trailing `/`.
pub fn sanitize_url(u: &str) -> String {
    let domain_and_path = format!("{}{}", get_domain(u), get_path(u));
    let mut result = add_https_if_missing(&domain_and_path);
    while result.ends_with('/') {
        result.pop();
    }
    result
}

/// True if `u` contains `#` (fragment-only, or any fragment) or ends in any
/// of the static-resource extensions.
pub fn is_id_or_static_resource(u: &str) -> bool {
    u.contains('#') || STATIC_EXTENSIONS.iter().any(|ext| u.ends_with(ext))
}

/// `get_domain(b)` is a substring of `get_domain(a)`. Stricter than the
/// fetcher's own "internal link" notion, and the one used everywhere the
/// crawl references "same domain".
///
/// Substring (not label-suffix) matching admits pathological false
/// positives — e.g. `b = "co"` vs `a = "evilco.com"`. Preserved for
/// behavioral parity with the source; this is a known quirk, not a bug to
/// casually "fix".
pub fn is_from_same_domain_or_subdomain(a: &str, b: &str) -> bool {
    get_domain(a).contains(&get_domain(b))
}

/// `!is_id_or_static_resource(u) && is_from_same_domain_or_subdomain(u, domain_url)`.
pub fn is_valid_internal_link(domain_url: &str, u: &str) -> bool {
    !is_id_or_static_resource(u) && is_from_same_domain_or_subdomain(u, domain_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_url_normalizes_case_slashes_query_and_fragment() {
        assert_eq!(
            sanitize_url("HTTPS://WWW.Example.COM/path//x/?q=1#frag"),
            "https://example.com/path/x"
        );
    }

    #[test]
    fn sanitize_url_is_idempotent() {
        let inputs = [
            "HTTPS://WWW.Example.COM/path//x/?q=1#frag",
            "benkuhn.net",
            "https://scraps.benkuhn.net/a/b/c/",
            "www.example.com",
        ];
        for u in inputs {
            let once = sanitize_url(u);
            let twice = sanitize_url(&once);
            assert_eq!(once, twice, "not idempotent for {u}");
        }
    }

    #[test]
    fn get_domain_strips_www_and_userinfo() {
        assert_eq!(get_domain("www.benkuhn.net"), "benkuhn.net");
        assert_eq!(get_domain("https://benkuhn.net"), "benkuhn.net");
        assert_eq!(get_domain("https://www.benkuhn.net"), "benkuhn.net");
        assert_eq!(get_domain("https://engineering.ramp.com/"), "engineering.ramp.com");
        assert_eq!(get_domain("mailto:user@example.com"), "example.com");
    }

    #[test]
    fn is_id_or_static_resource_matches_fragments_and_extensions() {
        assert!(is_id_or_static_resource("https://x/y.pdf"));
        assert!(is_id_or_static_resource("https://x/y#h"));
        assert!(!is_id_or_static_resource("https://x/y.html"));
    }

    #[test]
    fn same_domain_or_subdomain_is_directional() {
        assert!(is_from_same_domain_or_subdomain(
            "https://scraps.benkuhn.net/a",
            "https://benkuhn.net/"
        ));
        assert!(!is_from_same_domain_or_subdomain(
            "https://benkuhn.net/",
            "https://scraps.benkuhn.net/"
        ));
        assert!(is_from_same_domain_or_subdomain(
            "https://bigdanzblog.wordpress.com/",
            "https://wordpress.com/"
        ));
    }

    #[test]
    fn valid_internal_link_rejects_static_resources() {
        assert!(!is_valid_internal_link(
            "benkuhn.net",
            "https://benkuhn.net/favicon.png"
        ));
        assert!(is_valid_internal_link(
            "benkuhn.net",
            "https://benkuhn.net/posts/1"
        ));
    }
}
