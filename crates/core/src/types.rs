use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The kind of entity a classified domain's author/operator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Person,
    Company,
    Organization,
    Government,
    School,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Entity::Person => "person",
            Entity::Company => "company",
            Entity::Organization => "organization",
            Entity::Government => "government",
            Entity::School => "school",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Entity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(Entity::Person),
            "company" => Ok(Entity::Company),
            "organization" => Ok(Entity::Organization),
            "government" => Ok(Entity::Government),
            "school" => Ok(Entity::School),
            other => Err(anyhow::anyhow!("unknown entity kind: {other}")),
        }
    }
}

/// One blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub summary: String,
    pub author: String,
    /// Ordered sequence of short text tags. Stored as a Postgres `text[]`.
    pub topics: Vec<String>,
    pub date_published: Option<NaiveDate>,
    /// Canonical URL; unique per row in practice though not a PK.
    pub entry_url: String,
    /// Canonical URLs that redirected to `entry_url`.
    pub alias_urls: BTreeSet<String>,
    /// Canonical URLs (internal and external) discovered on the page.
    pub links: BTreeSet<String>,
    pub domain_url: String,
}

/// One accepted, crawled site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    /// Canonical netloc (`www.` stripped, mailto user stripped); primary key.
    pub domain_url: String,
    pub entity: Entity,
    pub name: String,
    /// Pre-redirect netlocs that resolved to this one.
    pub alias_domains: BTreeSet<String>,
    pub external_domains: BTreeSet<String>,
    pub external_links: BTreeSet<String>,
    pub target_internal_links: BTreeSet<String>,
    pub nontarget_internal_links: BTreeSet<String>,
    pub date_last_scraped: NaiveDate,
}

impl Domain {
    /// A fresh `Domain` with empty link sets, as handed to the BFS engine.
    pub fn new_empty(domain_url: String, entity: Entity, name: String) -> Self {
        Self {
            domain_url,
            entity,
            name,
            alias_domains: BTreeSet::new(),
            external_domains: BTreeSet::new(),
            external_links: BTreeSet::new(),
            target_internal_links: BTreeSet::new(),
            nontarget_internal_links: BTreeSet::new(),
            date_last_scraped: chrono::Utc::now().date_naive(),
        }
    }
}

/// One rejected site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedDomain {
    pub domain_url: String,
    pub entity: Entity,
    pub alias_domains: BTreeSet<String>,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_round_trips_through_str() {
        for e in [
            Entity::Person,
            Entity::Company,
            Entity::Organization,
            Entity::Government,
            Entity::School,
        ] {
            let s = e.to_string();
            let parsed: Entity = s.parse().unwrap();
            assert_eq!(parsed, e);
        }
    }

    #[test]
    fn unknown_entity_string_is_rejected() {
        assert!("alien".parse::<Entity>().is_err());
    }
}
