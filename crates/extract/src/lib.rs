//! Extractor adapters: two structured language-model callers, each taking
//! `(url, cleaned_html)` and returning a schema-validated struct.

mod claude;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use thiserror::Error;

pub use claude::Claude;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("network error: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Validation failure against the expected schema — retryable by the
    /// caller.
    #[error("response did not match schema: {0}")]
    SchemaMismatch(String),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ClassifyDomainOutput {
    pub url: String,
    /// One of: person, company, organization, government, school.
    pub entity: String,
    /// Human-readable name of the entity. "NONE" if absent from the page.
    pub name: String,
    pub blog: bool,
}

impl ClassifyDomainOutput {
    /// `blog && entity == "person"` is the sole acceptance criterion; any
    /// other shape (unrecognized entity string, non-blog, non-person) is a
    /// rejection, not an error.
    pub fn is_individual_blog(&self) -> bool {
        self.blog && self.entity.eq_ignore_ascii_case("person")
    }

    pub fn entity_kind(&self) -> Option<blogcrawler_core::Entity> {
        self.entity.to_ascii_lowercase().parse().ok()
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ParseEntryOutput {
    /// Whether the HTML represents a standalone blog post. If false, every
    /// other field may be empty and must not be treated as meaningful.
    pub should_pursue: bool,
    pub title: String,
    pub summary: String,
    /// Short relevant topics, most salient first.
    pub topics: Vec<String>,
    pub author: String,
    /// `YYYY-MM-DD` if known, else empty. Parsed further upstream.
    pub date_published: String,
}

#[async_trait]
pub trait DomainClassifier: Send + Sync {
    async fn classify(&self, url: &str, html: &str) -> Result<ClassifyDomainOutput, ExtractError>;
}

#[async_trait]
pub trait EntryParser: Send + Sync {
    async fn parse(&self, url: &str, html: &str) -> Result<ParseEntryOutput, ExtractError>;
}

const CLASSIFY_DOMAIN_SYSTEM: &str = "";

fn classify_domain_prompt(url: &str, html: &str) -> String {
    format!(
        "You're given the URL and HTML of a webpage. Your task is to extract information about the webpage.\n\n\
         URL:\n{url}\n\n\
         HTML:\n{html}\n\n\
         Determine the following:\n\
         - url: the URL\n\
         - entity: the type of entity represented by the website (person, company, organization, government, school); if not readily obvious, it is likely an individual\n\
         - name: the name of the entity that is writing. If none is present, output \"NONE\"\n\
         - blog: whether the website is a blog"
    )
}

const PARSE_ENTRY_SYSTEM: &str = "";

fn parse_entry_prompt(url: &str, html: &str) -> String {
    format!(
        "You're given the HTML of a webpage. Your task is to parse the unstructured contents of the web page \
         into a structured form to provide content to an RSS reader.\n\n\
         URL:\n{url}\n\n\
         HTML:\n{html}\n\n\
         Determine the following:\n\
         - should_pursue: is the HTML representative of a standalone blog post? Only fill the remainder of the \
           fields if your answer is yes; otherwise leave them empty.\n\
         - title: what is the title?\n\
         - summary: summarize the above content in two sentences. Be creative and try to capture the essence of \
           the text. Does not have to be an objective summary — try to mimic the voice of the author as much as \
           you can. Do not use \"the author\" or \"I\" as pronouns; speak directly to the reader.\n\
         - topics: a list of key relevant topics\n\
         - author: who wrote the article? If unknown, write exactly \"Unkown\" (sic).\n\
         - date_published: when was the article published, as YYYY-MM-DD? If unknown or invalid, leave empty."
    )
}

pub struct ClaudeDomainClassifier {
    client: Claude,
}

impl ClaudeDomainClassifier {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Claude::new(api_key, model),
        }
    }
}

#[async_trait]
impl DomainClassifier for ClaudeDomainClassifier {
    async fn classify(&self, url: &str, html: &str) -> Result<ClassifyDomainOutput, ExtractError> {
        self.client
            .extract(CLASSIFY_DOMAIN_SYSTEM, &classify_domain_prompt(url, html))
            .await
    }
}

pub struct ClaudeEntryParser {
    client: Claude,
}

impl ClaudeEntryParser {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Claude::new(api_key, model),
        }
    }
}

#[async_trait]
impl EntryParser for ClaudeEntryParser {
    async fn parse(&self, url: &str, html: &str) -> Result<ParseEntryOutput, ExtractError> {
        self.client
            .extract(PARSE_ENTRY_SYSTEM, &parse_entry_prompt(url, html))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(entity: &str, blog: bool) -> ClassifyDomainOutput {
        ClassifyDomainOutput {
            url: "https://example.com".into(),
            entity: entity.into(),
            name: "Jane".into(),
            blog,
        }
    }

    #[test]
    fn only_person_blog_is_accepted() {
        assert!(output("person", true).is_individual_blog());
        assert!(!output("person", false).is_individual_blog());
        assert!(!output("company", true).is_individual_blog());
    }

    #[test]
    fn entity_kind_parses_known_strings() {
        assert_eq!(
            output("Person", true).entity_kind(),
            Some(blogcrawler_core::Entity::Person)
        );
        assert_eq!(output("alien", true).entity_kind(), None);
    }
}
