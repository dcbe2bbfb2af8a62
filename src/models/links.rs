use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the link holding a resource's canonical URL.
pub const SELF_LINK: &str = "Self";

/// Hypermedia links attached to a resource, keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, String>);

impl Links {
    pub fn self_link(&self) -> Option<&str> {
        self.0.get(SELF_LINK).map(String::as_str)
    }

    pub fn set_self(&mut self, href: impl Into<String>) {
        self.0.insert(SELF_LINK.to_string(), href.into());
    }

    pub fn get(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(String::as_str)
    }
}

/// A page of resources as returned by collection endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResourceCollection<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> ResourceCollection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            links: Links::default(),
            extra: Map::new(),
        }
    }
}
