//! Compatibility diff engine: walks two contracts' pattern trees and
//! aggregates every structural divergence into one report.
//!
//! Backward compatibility means the newer contract must accept every value
//! the older contract allowed. Narrowing (the newer accepted set is a
//! strict subset of the older) is a divergence; widening is compatible.
//! The engine enumerates all breaking changes in one pass instead of
//! stopping at the first.

use std::collections::BTreeMap;

use crate::contract::Contract;
use crate::error::PatternError;
use crate::multipart::MultiPartPattern;
use crate::pattern::{is_optional, without_optionality, Pattern};
use crate::resolver::Resolver;
use crate::result::{DiffResults, MatchFailure, MatchResult};

/// Lookup chains deeper than this terminate as compatible; recursion past
/// the limit means a self-referential type on one side.
const TYPE_DEPTH_LIMIT: usize = 32;

/// Compare two contract versions and report every divergence.
pub fn find_differences(older: &Contract, newer: &Contract) -> Result<DiffResults, PatternError> {
    let older_resolver = older.resolver();
    let newer_resolver = newer.resolver();
    let mut results = DiffResults::new();

    match (&older.body, &newer.body) {
        (Some(older_body), Some(newer_body)) => {
            if let MatchResult::Failure(failure) = encompasses(
                newer_body,
                older_body,
                &newer_resolver,
                &older_resolver,
                0,
            )? {
                results.push(failure.with_breadcrumb("body"));
            }
        }
        (None, Some(_)) => results.push(
            MatchFailure::new("the newer contract requires a body the older contract never sent")
                .with_breadcrumb("body"),
        ),
        (Some(_), None) => results.push(
            MatchFailure::new("the newer contract no longer accepts a body")
                .with_breadcrumb("body"),
        ),
        (None, None) => {}
    }

    diff_multipart(older, newer, &older_resolver, &newer_resolver, &mut results)?;
    Ok(results)
}

/// Multipart parts are compared by row-key identity, never by position.
fn diff_multipart(
    older: &Contract,
    newer: &Contract,
    older_resolver: &Resolver,
    newer_resolver: &Resolver,
    results: &mut DiffResults,
) -> Result<(), PatternError> {
    let older_parts: BTreeMap<String, &MultiPartPattern> = older
        .multipart
        .iter()
        .map(|part| (part.row_key(), part))
        .collect();
    let newer_parts: BTreeMap<String, &MultiPartPattern> = newer
        .multipart
        .iter()
        .map(|part| (part.row_key(), part))
        .collect();

    for (key, newer_part) in &newer_parts {
        let stripped = without_optionality(newer_part.name()).to_string();
        match older_parts.get(key) {
            Some(older_part) => {
                for failure in
                    part_encompasses(newer_part, older_part, newer_resolver, older_resolver)?
                {
                    results.push(failure.with_breadcrumb(&stripped));
                }
            }
            None => {
                if !is_optional(newer_part.name()) {
                    results.push(
                        MatchFailure::new(format!(
                            "the newer contract requires a part named {} that the older contract never sent",
                            stripped
                        ))
                        .with_breadcrumb(&stripped),
                    );
                }
            }
        }
    }

    for (key, older_part) in &older_parts {
        if !newer_parts.contains_key(key) {
            let stripped = without_optionality(older_part.name()).to_string();
            results.push(
                MatchFailure::new(format!(
                    "the part named {} is no longer recognized by the newer contract",
                    stripped
                ))
                .with_breadcrumb(&stripped),
            );
        }
    }

    Ok(())
}

/// Divergences between two parts sharing one identity key.
fn part_encompasses(
    newer: &MultiPartPattern,
    older: &MultiPartPattern,
    newer_resolver: &Resolver,
    older_resolver: &Resolver,
) -> Result<Vec<MatchFailure>, PatternError> {
    let mut failures = Vec::new();

    // Optionality narrowing: older callers may omit the part.
    if is_optional(older.name()) && !is_optional(newer.name()) {
        failures.push(MatchFailure::new(
            "the part was optional in the older contract but is mandatory in the newer contract",
        ));
    }

    match (newer, older) {
        (MultiPartPattern::Content(newer_part), MultiPartPattern::Content(older_part)) => {
            if let MatchResult::Failure(failure) = encompasses(
                &newer_part.content,
                &older_part.content,
                newer_resolver,
                older_resolver,
                0,
            )? {
                failures.push(failure.with_breadcrumb("content"));
            }
        }
        (MultiPartPattern::File(newer_part), MultiPartPattern::File(older_part)) => {
            if let MatchResult::Failure(failure) = encompasses(
                &newer_part.filename,
                &older_part.filename,
                newer_resolver,
                older_resolver,
                0,
            )? {
                failures.push(failure.with_breadcrumb("filename"));
            }
            if let Some(declared) = &newer_part.content_encoding {
                if older_part.content_encoding.as_deref() != Some(declared.as_str()) {
                    failures.push(
                        MatchFailure::new(format!(
                            "the newer contract requires content encoding {}, the older contract declared {}",
                            declared,
                            older_part.content_encoding.as_deref().unwrap_or("none")
                        ))
                        .with_breadcrumb("contentEncoding"),
                    );
                }
            }
        }
        (MultiPartPattern::Array(newer_part), MultiPartPattern::Array(older_part)) => {
            if let MatchResult::Failure(failure) = encompasses(
                &newer_part.element,
                &older_part.element,
                newer_resolver,
                older_resolver,
                0,
            )? {
                failures.push(failure.with_breadcrumb("content"));
            }
        }
        (newer_part, older_part) => {
            failures.push(MatchFailure::new(format!(
                "the part kind changed from {} to {}",
                kind_name(older_part),
                kind_name(newer_part)
            )));
        }
    }

    Ok(failures)
}

fn kind_name(part: &MultiPartPattern) -> &'static str {
    match part {
        MultiPartPattern::Content(_) => "an inline content part",
        MultiPartPattern::File(_) => "a file part",
        MultiPartPattern::Array(_) => "a repeated part",
    }
}

/// Does every value the older pattern accepts also satisfy the newer
/// pattern? Lookups are chased through each side's own resolver.
pub fn encompasses(
    newer: &Pattern,
    older: &Pattern,
    newer_resolver: &Resolver,
    older_resolver: &Resolver,
    depth: usize,
) -> Result<MatchResult, PatternError> {
    if depth > TYPE_DEPTH_LIMIT {
        return Ok(MatchResult::Success);
    }
    if let Pattern::Lookup { name, .. } = newer {
        let target = newer_resolver.lookup(without_optionality(name))?;
        return encompasses(&target, older, newer_resolver, older_resolver, depth + 1);
    }
    if let Pattern::Lookup { name, .. } = older {
        let target = older_resolver.lookup(without_optionality(name))?;
        return encompasses(newer, &target, newer_resolver, older_resolver, depth + 1);
    }

    match (newer, older) {
        (Pattern::Exact { value: newer_value }, Pattern::Exact { value: older_value }) => {
            if newer_value == older_value {
                Ok(MatchResult::Success)
            } else {
                Ok(MatchResult::Failure(MatchFailure::new(format!(
                    "the older contract sends exactly {}, the newer contract expects exactly {}",
                    older_value.display_value(),
                    newer_value.display_value()
                ))))
            }
        }
        // Narrowing a type to one fixed value rejects everything else the
        // older contract allowed.
        (Pattern::Exact { value }, older_type) => {
            Ok(MatchResult::Failure(MatchFailure::new(format!(
                "the newer contract narrowed {} down to exactly {}",
                older_type.type_name(),
                value.display_value()
            ))))
        }
        // Widening a fixed value to a type is fine as long as the value
        // fits the type.
        (newer_type, Pattern::Exact { value }) => {
            match newer_type.matches(value, newer_resolver)? {
                MatchResult::Success => Ok(MatchResult::Success),
                MatchResult::Failure(failure) => Ok(MatchResult::Failure(
                    MatchFailure::new(format!(
                        "the older contract sends exactly {}, which the newer contract does not accept",
                        value.display_value()
                    ))
                    .with_cause(failure),
                )),
            }
        }
        // A string accepts any scalar literal form.
        (Pattern::String, Pattern::String)
        | (Pattern::String, Pattern::Number)
        | (Pattern::String, Pattern::Boolean)
        | (Pattern::String, Pattern::Binary)
        | (Pattern::Number, Pattern::Number)
        | (Pattern::Boolean, Pattern::Boolean)
        | (Pattern::Binary, Pattern::Binary) => Ok(MatchResult::Success),
        (newer_type, older_type) => Ok(MatchResult::Failure(MatchFailure::new(format!(
            "the older contract sends {}, which the newer contract ({}) does not accept",
            older_type.type_name(),
            newer_type.type_name()
        )))),
    }
}
