//! The pattern type: schema nodes capable of matching values, generating
//! samples, and deriving example-based variants.
//!
//! The variant set is closed; every consumption site matches exhaustively,
//! so adding a pattern kind is a compile-time-checked change. Recursive
//! schemas are expressed with `Lookup` indirections through the resolver's
//! registry, never with direct links.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::PatternError;
use crate::resolver::Resolver;
use crate::result::{MatchFailure, MatchResult};
use crate::row::Row;
use crate::value::Value;

/// A name suffixed with `?` marks an optional field or part.
pub fn is_optional(name: &str) -> bool {
    name.ends_with('?')
}

/// Strip the optionality marker. Idempotent: stripping a stripped name is
/// a no-op.
pub fn without_optionality(name: &str) -> &str {
    name.trim_end_matches('?')
}

/// One schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    /// Any string value.
    String,
    /// Any numeric value.
    Number,
    /// Any boolean value.
    Boolean,
    /// Any binary value.
    Binary,
    /// Matches iff structurally equal to `value`.
    Exact { value: Value },
    /// Named indirection, resolved through the registry at match/generate
    /// time. Chains of lookups must terminate; a cyclic chain is a schema
    /// defect.
    Lookup {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
}

impl Pattern {
    pub fn lookup(name: impl Into<String>) -> Pattern {
        Pattern::Lookup {
            name: name.into(),
            key: None,
        }
    }

    pub fn exact(value: Value) -> Pattern {
        Pattern::Exact { value }
    }

    /// Human type name for failure messages.
    pub fn type_name(&self) -> String {
        match self {
            Pattern::String => "string".to_string(),
            Pattern::Number => "number".to_string(),
            Pattern::Boolean => "boolean".to_string(),
            Pattern::Binary => "binary".to_string(),
            Pattern::Exact { value } => value.display_type().to_string(),
            Pattern::Lookup { name, .. } => without_optionality(name).to_string(),
        }
    }

    /// Structural/type check of one value against this pattern.
    pub fn matches(&self, sample: &Value, resolver: &Resolver) -> Result<MatchResult, PatternError> {
        match self {
            Pattern::String => Ok(type_check(matches!(sample, Value::String(_)), "string", sample)),
            Pattern::Number => Ok(type_check(matches!(sample, Value::Number(_)), "number", sample)),
            Pattern::Boolean => Ok(type_check(
                matches!(sample, Value::Boolean(_)),
                "boolean",
                sample,
            )),
            Pattern::Binary => Ok(type_check(matches!(sample, Value::Binary(_)), "binary", sample)),
            Pattern::Exact { value } => {
                if sample == value {
                    Ok(MatchResult::Success)
                } else {
                    Ok(MatchResult::Failure(MatchFailure::new(format!(
                        "expected {}, got {}",
                        value.display_value(),
                        sample.display_value()
                    ))))
                }
            }
            Pattern::Lookup { name, .. } => {
                let target = resolver.lookup(without_optionality(name))?;
                resolver.with_cycle_prevention(
                    name,
                    || MatchResult::Success,
                    |r| target.matches(sample, r),
                )
            }
        }
    }

    /// Produce one concrete value consistent with this pattern. Lookup
    /// indirections run under cycle prevention so self-referential schemas
    /// terminate with a placeholder.
    pub fn generate(&self, resolver: &Resolver) -> Result<Value, PatternError> {
        let mut rng = rand::thread_rng();
        match self {
            Pattern::String => {
                let text: String = (&mut rng)
                    .sample_iter(&rand::distributions::Alphanumeric)
                    .take(5)
                    .map(char::from)
                    .collect();
                Ok(Value::String(text))
            }
            Pattern::Number => Ok(Value::Number(Decimal::from(rng.gen_range(100..1000)))),
            Pattern::Boolean => Ok(Value::Boolean(rng.gen())),
            Pattern::Binary => {
                let bytes: Vec<u8> = (&mut rng)
                    .sample_iter(&rand::distributions::Alphanumeric)
                    .take(10)
                    .collect();
                Ok(Value::Binary(bytes))
            }
            Pattern::Exact { value } => Ok(value.clone()),
            Pattern::Lookup { name, .. } => {
                let target = resolver.lookup(without_optionality(name))?;
                resolver.with_cycle_prevention(name, || Value::Null, |r| target.generate(r))
            }
        }
    }

    /// Textual deserialization into this pattern's value domain.
    pub fn parse(&self, text: &str, resolver: &Resolver) -> Result<Value, PatternError> {
        match self {
            Pattern::String => Ok(Value::String(text.to_string())),
            Pattern::Number => Decimal::from_str(text.trim())
                .map(Value::Number)
                .map_err(|_| PatternError::Parse {
                    text: text.to_string(),
                    type_name: "number".to_string(),
                }),
            Pattern::Boolean => match text.trim() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(PatternError::Parse {
                    text: text.to_string(),
                    type_name: "boolean".to_string(),
                }),
            },
            Pattern::Binary => Ok(Value::Binary(text.as_bytes().to_vec())),
            Pattern::Exact { value } => match value {
                Value::String(_) => Pattern::String.parse(text, resolver),
                Value::Number(_) => Pattern::Number.parse(text, resolver),
                Value::Boolean(_) => Pattern::Boolean.parse(text, resolver),
                Value::Binary(_) => Pattern::Binary.parse(text, resolver),
                other => Err(PatternError::Parse {
                    text: text.to_string(),
                    type_name: other.display_type().to_string(),
                }),
            },
            Pattern::Lookup { .. } => self.resolve(resolver)?.parse(text, resolver),
        }
    }

    /// Example-driven variant expansion. When the resolver policy requests
    /// negative testing, scalar leaves also emit boundary-violating
    /// mutations.
    pub fn new_variants(&self, row: &Row, resolver: &Resolver) -> Result<Vec<Pattern>, PatternError> {
        match self {
            Pattern::Lookup { name, .. } => {
                let target = resolver.lookup(without_optionality(name))?;
                let fallback = self.clone();
                resolver.with_cycle_prevention(
                    name,
                    || vec![fallback],
                    |r| target.new_variants(row, r),
                )
            }
            _ => {
                let mut variants = vec![self.clone()];
                if resolver.policy().negative {
                    variants.extend(self.negative_variants());
                }
                Ok(variants)
            }
        }
    }

    /// Boundary-violating mutations of this pattern, for negative tests.
    fn negative_variants(&self) -> Vec<Pattern> {
        let null = Pattern::exact(Value::Null);
        match self {
            Pattern::String => vec![null, Pattern::Number, Pattern::Boolean],
            Pattern::Number => vec![null, Pattern::Boolean, Pattern::String],
            Pattern::Boolean => vec![null, Pattern::Number, Pattern::String],
            Pattern::Binary => vec![null],
            Pattern::Exact { .. } | Pattern::Lookup { .. } => Vec::new(),
        }
    }

    /// An equivalent pattern with the optionality marker removed from its
    /// name. Identity comparisons always go through this.
    pub fn strip_optionality(&self) -> Pattern {
        match self {
            Pattern::Lookup { name, key } => Pattern::Lookup {
                name: without_optionality(name).to_string(),
                key: key.clone(),
            },
            other => other.clone(),
        }
    }

    /// The example-table column key this pattern reads overrides from.
    pub fn row_key(&self) -> String {
        match self {
            Pattern::Lookup { name, key } => key
                .clone()
                .unwrap_or_else(|| without_optionality(name).to_string()),
            other => other.type_name(),
        }
    }

    /// Chase lookup chains to the underlying concrete pattern. A chain
    /// that revisits a name is a schema defect.
    pub fn resolve(&self, resolver: &Resolver) -> Result<Pattern, PatternError> {
        let mut seen = BTreeSet::new();
        let mut current = self.clone();
        while let Pattern::Lookup { name, .. } = &current {
            let stripped = without_optionality(name).to_string();
            if !seen.insert(stripped.clone()) {
                return Err(PatternError::CyclicReference { name: stripped });
            }
            current = resolver.lookup(&stripped)?;
        }
        Ok(current)
    }
}

impl Value {
    /// The pattern that matches exactly this value -- except strings that
    /// are type tokens like `"(number)"`, which become lookups.
    pub fn exact_match_else_type(&self) -> Pattern {
        if let Value::String(text) = self {
            if let Some(name) = pattern_token(text) {
                return Pattern::lookup(name);
            }
        }
        Pattern::exact(self.clone())
    }
}

/// `"(name)"` -> `Some("name")`.
fn pattern_token(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .filter(|name| !name.is_empty())
}

fn type_check(matched: bool, expected: &str, sample: &Value) -> MatchResult {
    if matched {
        MatchResult::Success
    } else {
        MatchResult::Failure(MatchFailure::new(format!(
            "expected {}, got {}",
            expected,
            sample.display_value()
        )))
    }
}

/// Variant expansion for a field keyed by `key`: a row override becomes a
/// single exact-value variant (validated against the pattern), an absent
/// column delegates to the pattern's own expansion.
pub(crate) fn variants_for_row_key(
    row: &Row,
    key: &str,
    pattern: &Pattern,
    resolver: &Resolver,
) -> Result<Vec<Pattern>, PatternError> {
    match row.get_field(key) {
        Some(text) => {
            let value = match pattern.parse(text, resolver) {
                Ok(value) => value,
                Err(PatternError::Parse { .. }) => Value::String(text.to_string()),
                Err(other) => return Err(other),
            };
            match pattern.matches(&value, resolver)? {
                MatchResult::Success => Ok(vec![Pattern::exact(value)]),
                MatchResult::Failure(failure) => Err(PatternError::InvalidExample {
                    key: key.to_string(),
                    message: failure.report(),
                }),
            }
        }
        None => pattern.new_variants(row, resolver),
    }
}
