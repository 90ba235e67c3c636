use async_trait::async_trait;

/// Operator confirmation capability. The source blocks on an interactive
/// TTY during ingest; factoring it out lets tests drive ingest
/// deterministically without stdin.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Returns `true` iff the operator approved scraping `domain_url`.
    async fn confirm(&self, domain_url: &str) -> bool;
}

/// Always approves — used for unattended / scripted crawls.
pub struct AlwaysYes;

#[async_trait]
impl Confirmer for AlwaysYes {
    async fn confirm(&self, _domain_url: &str) -> bool {
        true
    }
}

/// Always rejects — used in tests that assert the exclusion path.
pub struct AlwaysNo;

#[async_trait]
impl Confirmer for AlwaysNo {
    async fn confirm(&self, _domain_url: &str) -> bool {
        false
    }
}

/// Prompts on stdin, exactly as the source does: `strip().upper() == "Y"`.
pub struct Prompt;

#[async_trait]
impl Confirmer for Prompt {
    async fn confirm(&self, domain_url: &str) -> bool {
        use std::io::Write;

        print!(
            "\x1b[1;32mScraping: {domain_url} — Press Y to scrape and anything else to skip & add to ExcludedDomains table (e.g. blacklist): \x1b[0m"
        );
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        line.trim().eq_ignore_ascii_case("y")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_yes_confirms() {
        assert!(AlwaysYes.confirm("example.com").await);
    }

    #[tokio::test]
    async fn always_no_rejects() {
        assert!(!AlwaysNo.confirm("example.com").await);
    }
}
