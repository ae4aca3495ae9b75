//! Contract bundles: the pattern-tree package schema parsers emit and the
//! engine consumes.
//!
//! A contract carries an optional body pattern, the multipart form fields,
//! and the named-pattern registry. Bundles round-trip through an
//! interchange JSON format so they can be produced by external readers and
//! loaded from disk.

use serde::{Deserialize, Serialize};

use crate::error::PatternError;
use crate::multipart::MultiPartPattern;
use crate::pattern::Pattern;
use crate::resolver::{GenerationPolicy, PatternRegistry, Resolver};

/// One contract version: a pattern tree plus its named-type registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multipart: Vec<MultiPartPattern>,
    #[serde(default, skip_serializing_if = "PatternRegistry::is_empty")]
    pub types: PatternRegistry,
}

impl Contract {
    pub fn new(name: impl Into<String>) -> Self {
        Contract {
            name: name.into(),
            ..Contract::default()
        }
    }

    /// Deserialize a contract from interchange JSON.
    pub fn from_json(text: &str) -> Result<Contract, PatternError> {
        serde_json::from_str(text).map_err(|err| PatternError::MalformedContract {
            message: err.to_string(),
        })
    }

    /// Serialize to pretty interchange JSON.
    pub fn to_json(&self) -> Result<String, PatternError> {
        serde_json::to_string_pretty(self).map_err(|err| PatternError::MalformedContract {
            message: err.to_string(),
        })
    }

    /// A fresh resolver over this contract's registry.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.types)
    }

    pub fn resolver_with(&self, policy: GenerationPolicy) -> Resolver<'_> {
        Resolver::with_policy(&self.types, policy)
    }
}
