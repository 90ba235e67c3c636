use scraper::{Html, Selector};

use crate::Link;

/// Strip `<script>` and `<style>` element bodies. A tag-soup regex is
/// enough here: the cleaned HTML only needs to be readable by the
/// extractor, not re-rendered.
pub fn clean_html(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let Ok(script_or_style) = Selector::parse("script, style, noscript") else {
        return raw.to_string();
    };

    let mut removed_ranges: Vec<(usize, usize)> = Vec::new();
    for el in document.select(&script_or_style) {
        let range = el.html();
        if let Some(start) = raw.find(&range) {
            removed_ranges.push((start, start + range.len()));
        }
    }
    removed_ranges.sort_unstable();

    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0;
    for (start, end) in removed_ranges {
        if start < cursor {
            continue;
        }
        out.push_str(&raw[cursor..start]);
        cursor = end;
    }
    out.push_str(&raw[cursor..]);
    out
}

/// Every `href` on the page, split into internal/external against
/// `base_domain` using plain domain equality — the fetcher's own notion,
/// deliberately looser than the canonicalizer's `is_valid_internal_link`,
/// which re-filters the next batch of internal links anyway.
pub fn extract_links(raw_html: &str, base_url: &str, base_domain: &str) -> (Vec<Link>, Vec<Link>) {
    let document = Html::parse_document(raw_html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return (Vec::new(), Vec::new());
    };

    let mut internal = Vec::new();
    let mut external = Vec::new();

    for el in document.select(&selector) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
            continue;
        }

        let resolved = match url::Url::parse(base_url).and_then(|base| base.join(href)) {
            Ok(u) => u.to_string(),
            Err(_) => continue,
        };

        if blogcrawler_canon::get_domain(&resolved) == base_domain {
            internal.push(Link { href: resolved });
        } else {
            external.push(Link { href: resolved });
        }
    }

    (internal, external)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_links_splits_internal_and_external() {
        let html = r#"
            <html><body>
                <a href="/posts/1">post</a>
                <a href="https://benkuhn.net/about">about</a>
                <a href="https://twitter.com/benkuhn">twitter</a>
                <a href="javascript:void(0)">noop</a>
                <a href="mailto:ben@benkuhn.net">email</a>
            </body></html>
        "#;
        let (internal, external) = extract_links(html, "https://benkuhn.net/", "benkuhn.net");
        assert_eq!(internal.len(), 2);
        assert_eq!(external.len(), 1);
        assert!(external[0].href.contains("twitter.com"));
    }

    #[test]
    fn clean_html_removes_script_and_style_bodies() {
        let html = "<html><head><style>body{color:red}</style></head><body><script>alert(1)</script><p>hi</p></body></html>";
        let cleaned = clean_html(html);
        assert!(!cleaned.contains("alert(1)"));
        assert!(!cleaned.contains("color:red"));
        assert!(cleaned.contains("<p>hi</p>"));
    }
}
