//! Multipart form-field patterns: inline content parts, file parts, and
//! repeated (array) parts sharing one logical name.
//!
//! Part names carry the `?` optionality suffix; identity comparisons and
//! emitted value names always use the stripped form.

use serde::{Deserialize, Serialize};

use crate::error::PatternError;
use crate::pattern::{is_optional, variants_for_row_key, without_optionality, Pattern};
use crate::resolver::Resolver;
use crate::result::{FailureReason, MatchFailure, MatchResult};
use crate::row::Row;
use crate::value::Value;

/// One multipart form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MultiPartPattern {
    Content(ContentPart),
    File(FilePart),
    Array(ArrayPart),
}

impl MultiPartPattern {
    pub fn name(&self) -> &str {
        match self {
            MultiPartPattern::Content(part) => &part.name,
            MultiPartPattern::File(part) => &part.name,
            MultiPartPattern::Array(part) => &part.name,
        }
    }

    /// The example-table column key for this part.
    pub fn row_key(&self) -> String {
        match self {
            MultiPartPattern::Content(part) => part.row_key(),
            MultiPartPattern::File(part) => part.row_key(),
            MultiPartPattern::Array(part) => part.row_key(),
        }
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> Result<MatchResult, PatternError> {
        match self {
            MultiPartPattern::Content(part) => part.matches(value, resolver),
            MultiPartPattern::File(part) => part.matches(value, resolver),
            MultiPartPattern::Array(part) => part.matches(value, resolver),
        }
    }

    /// Generate the concrete part values for this pattern. Content and
    /// file parts produce one value; an array part produces one per
    /// derived sub-pattern.
    pub fn generate(&self, resolver: &Resolver) -> Result<Vec<Value>, PatternError> {
        match self {
            MultiPartPattern::Content(part) => Ok(vec![part.generate(resolver)?]),
            MultiPartPattern::File(part) => Ok(vec![part.generate(resolver)?]),
            MultiPartPattern::Array(part) => part.generate(resolver),
        }
    }

    /// Example-driven variant expansion. `None` entries are the omitted
    /// part -- a first-class generation outcome for optional fields.
    pub fn new_variants(
        &self,
        row: &Row,
        resolver: &Resolver,
    ) -> Result<Vec<Option<MultiPartPattern>>, PatternError> {
        match self {
            MultiPartPattern::Content(part) => part.new_variants(row, resolver),
            MultiPartPattern::File(part) => part.new_variants(row, resolver),
            MultiPartPattern::Array(part) => part.new_variants(row, resolver),
        }
    }

    /// This part with the optionality marker stripped from its name.
    pub fn non_optional(&self) -> MultiPartPattern {
        match self {
            MultiPartPattern::Content(part) => MultiPartPattern::Content(ContentPart {
                name: without_optionality(&part.name).to_string(),
                ..part.clone()
            }),
            MultiPartPattern::File(part) => MultiPartPattern::File(FilePart {
                name: without_optionality(&part.name).to_string(),
                ..part.clone()
            }),
            MultiPartPattern::Array(part) => MultiPartPattern::Array(ArrayPart {
                name: without_optionality(&part.name).to_string(),
                ..part.clone()
            }),
        }
    }
}

// ──────────────────────────────────────────────
// Content parts
// ──────────────────────────────────────────────

/// One inline form field whose content follows a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    pub name: String,
    pub content: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ContentPart {
    pub fn new(name: impl Into<String>, content: Pattern) -> Self {
        ContentPart {
            name: name.into(),
            content,
            content_type: None,
        }
    }

    pub fn row_key(&self) -> String {
        without_optionality(&self.name).to_string()
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> Result<MatchResult, PatternError> {
        match value {
            Value::MultiPartFile { name, content, .. } => {
                if let Some(mismatch) = self.name_mismatch(name) {
                    return Ok(mismatch);
                }
                self.match_literal(&String::from_utf8_lossy(content), resolver)
            }
            Value::MultiPartContent { name, content, .. } => {
                if let Some(mismatch) = self.name_mismatch(name) {
                    return Ok(mismatch);
                }
                match content.as_ref() {
                    Value::String(literal) => self.match_literal(literal, resolver),
                    other => Ok(self
                        .content
                        .matches(other, resolver)?
                        .with_breadcrumb("content")),
                }
            }
            other => Ok(MatchResult::Failure(MatchFailure::new(format!(
                "expected a multipart part, got {}",
                other.display_type()
            )))),
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, PatternError> {
        Ok(Value::MultiPartContent {
            name: without_optionality(&self.name).to_string(),
            content: Box::new(self.content.generate(resolver)?),
            content_type: self.content_type.clone(),
        })
    }

    pub fn new_variants(
        &self,
        row: &Row,
        resolver: &Resolver,
    ) -> Result<Vec<Option<MultiPartPattern>>, PatternError> {
        let key = self.row_key();
        let inner = variants_for_row_key(row, &key, &self.content, resolver)?;
        let mut variants: Vec<Option<MultiPartPattern>> = inner
            .into_iter()
            .map(|content| {
                Some(MultiPartPattern::Content(ContentPart {
                    name: without_optionality(&self.name).to_string(),
                    content,
                    content_type: self.content_type.clone(),
                }))
            })
            .collect();
        if is_optional(&self.name) && !row.contains_field(&key) {
            variants.insert(0, None);
        }
        Ok(variants)
    }

    fn name_mismatch(&self, submitted: &str) -> Option<MatchResult> {
        if without_optionality(&self.name) == submitted {
            return None;
        }
        Some(MatchResult::Failure(
            MatchFailure::new(format!(
                "the contract expected a part named {}, but got {}",
                self.name, submitted
            ))
            .with_reason(FailureReason::PartNameMismatch),
        ))
    }

    /// Re-interpret the submitted literal as the declared content type
    /// before the structural comparison; a parse failure degrades to a raw
    /// string comparison instead of aborting the match.
    fn match_literal(
        &self,
        literal: &str,
        resolver: &Resolver,
    ) -> Result<MatchResult, PatternError> {
        let parsed = match self.content.parse(literal, resolver) {
            Ok(value) => value,
            Err(PatternError::Parse { .. }) => Value::String(literal.to_string()),
            Err(other) => return Err(other),
        };
        Ok(self
            .content
            .matches(&parsed, resolver)?
            .with_breadcrumb("content"))
    }
}

// ──────────────────────────────────────────────
// File parts
// ──────────────────────────────────────────────

/// One file form field. When `filename` is an exact file reference, the
/// submitted bytes must equal the referenced file's on-disk contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePart {
    pub name: String,
    pub filename: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
}

impl FilePart {
    pub fn new(name: impl Into<String>, filename: Pattern) -> Self {
        FilePart {
            name: name.into(),
            filename,
            content_type: None,
            content_encoding: None,
        }
    }

    pub fn row_key(&self) -> String {
        format!("{}_filename", without_optionality(&self.name))
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> Result<MatchResult, PatternError> {
        let (submitted_name, submitted_filename, submitted_content, submitted_encoding) =
            match value {
                Value::MultiPartFile {
                    name,
                    filename,
                    content,
                    content_encoding,
                    ..
                } => (name.as_str(), filename.as_str(), content, content_encoding),
                Value::MultiPartContent { .. } => {
                    return Ok(MatchResult::Failure(MatchFailure::new(
                        "the contract expected a file, but got content instead",
                    )))
                }
                other => {
                    return Ok(MatchResult::Failure(MatchFailure::new(format!(
                        "expected a multipart file part, got {}",
                        other.display_type()
                    ))))
                }
            };

        if without_optionality(&self.name) != submitted_name {
            return Ok(MatchResult::Failure(
                MatchFailure::new(format!(
                    "the contract expected a part named {}, but got {}",
                    self.name, submitted_name
                ))
                .with_reason(FailureReason::PartNameMismatch),
            ));
        }

        match &self.filename {
            Pattern::Exact { value: reference } => {
                let path = reference.to_string_literal();
                // A missing reference file is a configuration fault, not a
                // mismatch.
                let expected = read_reference_file(&path)?;
                if expected != *submitted_content {
                    return Ok(MatchResult::Failure(
                        MatchFailure::new(format!(
                            "in the part named {}, the contents in the request did not match the value in file {}",
                            self.name, path
                        ))
                        .with_reason(FailureReason::PartNameMismatch)
                        .with_cause(
                            MatchFailure::new(format!(
                                "submitted {} byte(s) differ from the {} byte(s) on disk",
                                submitted_content.len(),
                                expected.len()
                            ))
                            .with_breadcrumb("content"),
                        ),
                    ));
                }
            }
            other => {
                // The submitted filename is always a literal; re-interpret
                // it as the declared filename type before comparing.
                let parsed = match other.parse(submitted_filename, resolver) {
                    Ok(value) => value,
                    Err(PatternError::Parse { .. }) => {
                        Value::String(submitted_filename.to_string())
                    }
                    Err(fatal) => return Err(fatal),
                };
                if let MatchResult::Failure(failure) = other.matches(&parsed, resolver)? {
                    return Ok(MatchResult::Failure(
                        MatchFailure::new(format!(
                            "in the part named {}, the contract expected the filename to be {}, but got {}",
                            self.name,
                            other.type_name(),
                            submitted_filename
                        ))
                        .with_reason(FailureReason::PartNameMismatch)
                        .with_cause(failure),
                    ));
                }
            }
        }

        if let Some(declared) = &self.content_encoding {
            if submitted_encoding.as_deref() != Some(declared.as_str()) {
                let got = submitted_encoding
                    .as_deref()
                    .map(|encoding| format!("content encoding {}", encoding))
                    .unwrap_or_else(|| "no content encoding".to_string());
                return Ok(MatchResult::Failure(
                    MatchFailure::new(format!(
                        "the contract expected content encoding {}, but got {}",
                        declared, got
                    ))
                    .with_breadcrumb("contentEncoding"),
                ));
            }
        }

        Ok(MatchResult::Success)
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, PatternError> {
        let filename = self.filename.generate(resolver)?.to_string_literal();
        let content = match &self.filename {
            Pattern::Exact { value: reference } => {
                read_reference_file(&reference.to_string_literal())?
            }
            _ => Vec::new(),
        };
        Ok(Value::MultiPartFile {
            name: without_optionality(&self.name).to_string(),
            filename,
            content,
            content_type: self.content_type.clone(),
            content_encoding: self.content_encoding.clone(),
        })
    }

    pub fn new_variants(
        &self,
        row: &Row,
        _resolver: &Resolver,
    ) -> Result<Vec<Option<MultiPartPattern>>, PatternError> {
        let filename = match row.get_field(&self.row_key()) {
            Some(text) => Pattern::exact(Value::String(text.to_string())),
            None => self.filename.clone(),
        };
        Ok(vec![Some(MultiPartPattern::File(FilePart {
            filename,
            ..self.clone()
        }))])
    }
}

fn read_reference_file(path: &str) -> Result<Vec<u8>, PatternError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(PatternError::MissingReferenceFile {
                path: path.to_string(),
            })
        }
        Err(err) => Err(PatternError::FileRead {
            path: path.to_string(),
            message: err.to_string(),
        }),
    }
}

// ──────────────────────────────────────────────
// Array parts
// ──────────────────────────────────────────────

/// Zero-or-more repetitions of a file-or-content part sharing one logical
/// name. The `derived` list is a per-instance generation product computed
/// by `new_variants`; it is not part of the pattern's identity and never
/// serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayPart {
    pub name: String,
    pub element: Pattern,
    #[serde(skip)]
    pub derived: Vec<MultiPartPattern>,
}

impl PartialEq for ArrayPart {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.element == other.element
    }
}

impl ArrayPart {
    pub fn new(name: impl Into<String>, element: Pattern) -> Self {
        ArrayPart {
            name: name.into(),
            element,
            derived: Vec::new(),
        }
    }

    /// The single-instance part this array repeats: a file part for binary
    /// elements, a content part otherwise.
    fn element_part(&self) -> MultiPartPattern {
        match &self.element {
            Pattern::Binary => {
                MultiPartPattern::File(FilePart::new(self.name.clone(), self.element.clone()))
            }
            other => {
                MultiPartPattern::Content(ContentPart::new(self.name.clone(), other.clone()))
            }
        }
    }

    pub fn row_key(&self) -> String {
        self.element_part().row_key()
    }

    /// Matching one incoming value checks it against one instance of the
    /// element part; the repetition itself is validated by the caller.
    pub fn matches(&self, value: &Value, resolver: &Resolver) -> Result<MatchResult, PatternError> {
        if let Some(submitted) = value.part_name() {
            if without_optionality(&self.name) != submitted {
                return Ok(MatchResult::Failure(
                    MatchFailure::new(format!(
                        "the contract expected a part named {}, but got {}",
                        self.name, submitted
                    ))
                    .with_reason(FailureReason::PartNameMismatch),
                ));
            }
        }
        self.element_part().matches(value, resolver)
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Vec<Value>, PatternError> {
        let mut values = Vec::new();
        for part in &self.derived {
            values.extend(part.generate(resolver)?);
        }
        Ok(values)
    }

    /// Expand the row's field for this part's key as JSON: an array
    /// explodes into one synthetic row per element, a scalar keeps the
    /// single row, anything unparsable yields no synthetic rows, and a
    /// missing field generates exactly one vacuous part. Returns a new
    /// array part carrying the derived sub-pattern list; the template is
    /// never mutated.
    pub fn new_variants(
        &self,
        row: &Row,
        resolver: &Resolver,
    ) -> Result<Vec<Option<MultiPartPattern>>, PatternError> {
        let element_part = self.element_part();
        let key = element_part.row_key();

        let rows: Vec<Row> = match row.get_field(&key) {
            None => vec![row.clone()],
            Some(text) => match serde_json::from_str::<serde_json::Value>(text) {
                Ok(serde_json::Value::Array(items)) => items
                    .iter()
                    .map(|item| row.with_field_value(&key, &json_literal(item)))
                    .collect(),
                Ok(serde_json::Value::String(_))
                | Ok(serde_json::Value::Number(_))
                | Ok(serde_json::Value::Bool(_)) => vec![row.clone()],
                // Malformed row data: fall back to no synthetic rows
                // rather than aborting generation.
                Ok(_) | Err(_) => Vec::new(),
            },
        };

        let mut derived = Vec::new();
        for synthetic in &rows {
            derived.extend(
                element_part
                    .new_variants(synthetic, resolver)?
                    .into_iter()
                    .flatten(),
            );
        }

        Ok(vec![Some(MultiPartPattern::Array(ArrayPart {
            name: self.name.clone(),
            element: self.element.clone(),
            derived,
        }))])
    }
}

/// The literal form of a JSON element when substituted into a synthetic
/// row: strings unquoted, everything else as rendered JSON.
fn json_literal(item: &serde_json::Value) -> String {
    match item {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::PatternRegistry;
    use std::io::Write;

    fn content_value(name: &str, literal: &str) -> Value {
        Value::MultiPartContent {
            name: name.to_string(),
            content: Box::new(Value::String(literal.to_string())),
            content_type: None,
        }
    }

    fn derived_of(variants: Vec<Option<MultiPartPattern>>) -> Vec<MultiPartPattern> {
        match variants.into_iter().next().flatten() {
            Some(MultiPartPattern::Array(part)) => part.derived,
            other => panic!("expected a derived array part, got {:?}", other),
        }
    }

    #[test]
    fn part_name_mismatch_has_a_reason() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = ContentPart::new("id", Pattern::Number);

        let result = part
            .matches(&content_value("other", "10"), &resolver)
            .unwrap();
        let failure = result.into_failure().unwrap();
        assert_eq!(failure.reason, Some(FailureReason::PartNameMismatch));
    }

    #[test]
    fn submitted_literal_is_reinterpreted_as_the_content_type() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = ContentPart::new("age", Pattern::Number);

        assert!(part
            .matches(&content_value("age", "42"), &resolver)
            .unwrap()
            .is_success());

        // Parse failure degrades to a raw string comparison, reported as a
        // content mismatch rather than a parse crash.
        let result = part
            .matches(&content_value("age", "not-a-number"), &resolver)
            .unwrap();
        let failure = result.into_failure().unwrap();
        assert_eq!(failure.breadcrumb_path(), "content");
    }

    #[test]
    fn optional_part_prepends_the_omitted_variant() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let optional = ContentPart::new("address?", Pattern::String);

        let variants = optional.new_variants(&Row::new(), &resolver).unwrap();
        assert_eq!(variants.len(), 2);
        assert!(variants[0].is_none());
        match &variants[1] {
            Some(MultiPartPattern::Content(part)) => assert_eq!(part.name, "address"),
            other => panic!("expected a content part, got {:?}", other),
        }

        // With an override present, the omitted variant disappears.
        let row = Row::from_pairs([("address", "221B")]);
        let variants = optional.new_variants(&row, &resolver).unwrap();
        assert_eq!(variants.len(), 1);
        assert!(variants[0].is_some());
    }

    #[test]
    fn generated_content_part_matches_itself() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = ContentPart::new("age?", Pattern::Number);

        let value = part.generate(&resolver).unwrap();
        assert_eq!(value.part_name(), Some("age"));
        assert!(part.matches(&value, &resolver).unwrap().is_success());
    }

    #[test]
    fn file_part_row_override_pins_the_filename() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = FilePart::new("customers", Pattern::String);
        let row = Row::from_pairs([("customers_filename", "data.csv")]);

        let variants = part.new_variants(&row, &resolver).unwrap();
        match variants.into_iter().next().flatten() {
            Some(MultiPartPattern::File(derived)) => assert_eq!(
                derived.filename,
                Pattern::exact(Value::String("data.csv".into()))
            ),
            other => panic!("expected a file part, got {:?}", other),
        }
    }

    #[test]
    fn exact_file_match_compares_on_disk_bytes() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);

        let mut reference = tempfile::NamedTempFile::new().unwrap();
        reference.write_all(b"id,name\n1,Jane\n").unwrap();
        let path = reference.path().to_string_lossy().into_owned();

        let part = FilePart::new(
            "customers",
            Pattern::exact(Value::String(path.clone())),
        );

        let matching = Value::MultiPartFile {
            name: "customers".into(),
            filename: path.clone(),
            content: b"id,name\n1,Jane\n".to_vec(),
            content_type: None,
            content_encoding: None,
        };
        assert!(part.matches(&matching, &resolver).unwrap().is_success());

        let differing = Value::MultiPartFile {
            name: "customers".into(),
            filename: path,
            content: b"tampered".to_vec(),
            content_type: None,
            content_encoding: None,
        };
        let failure = part
            .matches(&differing, &resolver)
            .unwrap()
            .into_failure()
            .unwrap();
        assert_eq!(failure.reason, Some(FailureReason::PartNameMismatch));
        let cause = failure.cause.expect("cause chain rooted at the byte comparison");
        assert_eq!(cause.breadcrumb_path(), "content");
    }

    #[test]
    fn missing_reference_file_is_fatal_not_a_mismatch() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = FilePart::new(
            "customers",
            Pattern::exact(Value::String("/nonexistent/reference.csv".into())),
        );
        let submitted = Value::MultiPartFile {
            name: "customers".into(),
            filename: "reference.csv".into(),
            content: b"anything".to_vec(),
            content_type: None,
            content_encoding: None,
        };
        assert!(matches!(
            part.matches(&submitted, &resolver),
            Err(PatternError::MissingReferenceFile { .. })
        ));
    }

    #[test]
    fn content_encoding_mismatch_is_breadcrumbed() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = FilePart {
            name: "archive".into(),
            filename: Pattern::String,
            content_type: None,
            content_encoding: Some("gzip".into()),
        };
        let submitted = Value::MultiPartFile {
            name: "archive".into(),
            filename: "archive.bin".into(),
            content: Vec::new(),
            content_type: None,
            content_encoding: None,
        };
        let failure = part
            .matches(&submitted, &resolver)
            .unwrap()
            .into_failure()
            .unwrap();
        assert_eq!(failure.breadcrumb_path(), "contentEncoding");
    }

    #[test]
    fn array_row_explodes_per_json_element() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = ArrayPart::new("tags", Pattern::String);

        let row = Row::from_pairs([("tags", "[\"a\",\"b\"]")]);
        let derived = derived_of(part.new_variants(&row, &resolver).unwrap());
        assert_eq!(derived.len(), 2);

        let scalar_row = Row::from_pairs([("tags", "\"x\"")]);
        let derived = derived_of(part.new_variants(&scalar_row, &resolver).unwrap());
        assert_eq!(derived.len(), 1);

        let derived = derived_of(part.new_variants(&Row::new(), &resolver).unwrap());
        assert_eq!(derived.len(), 1, "missing field generates one vacuous part");
    }

    #[test]
    fn malformed_array_row_yields_no_synthetic_rows() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = ArrayPart::new("tags", Pattern::String);
        let row = Row::from_pairs([("tags", "[not json")]);

        let derived = derived_of(part.new_variants(&row, &resolver).unwrap());
        assert!(derived.is_empty());
    }

    #[test]
    fn derived_array_generates_one_value_per_sub_pattern() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let template = ArrayPart::new("tags", Pattern::String);
        let row = Row::from_pairs([("tags", "[\"a\",\"b\"]")]);

        let derived = match template
            .new_variants(&row, &resolver)
            .unwrap()
            .into_iter()
            .next()
            .flatten()
        {
            Some(MultiPartPattern::Array(part)) => part,
            other => panic!("expected an array part, got {:?}", other),
        };
        // The template itself is untouched; the derived part carries the
        // expansion.
        assert!(template.derived.is_empty());

        let values = derived.generate(&resolver).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], content_value("tags", "a"));
        assert_eq!(values[1], content_value("tags", "b"));
    }

    #[test]
    fn binary_elements_repeat_as_file_parts() {
        let part = ArrayPart::new("scans", Pattern::Binary);
        assert_eq!(part.row_key(), "scans_filename");
        let content = ArrayPart::new("tags", Pattern::String);
        assert_eq!(content.row_key(), "tags");
    }

    #[test]
    fn array_match_checks_one_element_instance() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let part = ArrayPart::new("counts", Pattern::Number);

        assert!(part
            .matches(&content_value("counts", "12"), &resolver)
            .unwrap()
            .is_success());
        let failure = part
            .matches(&content_value("other", "12"), &resolver)
            .unwrap()
            .into_failure()
            .unwrap();
        assert_eq!(failure.reason, Some(FailureReason::PartNameMismatch));
    }

    #[test]
    fn non_optional_stripping_is_idempotent() {
        let part = MultiPartPattern::Content(ContentPart::new("address?", Pattern::String));
        let once = part.non_optional();
        let twice = once.non_optional();
        assert_eq!(once.name(), "address");
        assert_eq!(once.name(), twice.name());
        assert_eq!(once.row_key(), part.row_key());
    }

    #[test]
    fn array_identity_ignores_the_derived_cache() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        let template = ArrayPart::new("tags", Pattern::String);
        let row = Row::from_pairs([("tags", "[\"a\",\"b\"]")]);
        let derived = match template
            .new_variants(&row, &resolver)
            .unwrap()
            .into_iter()
            .next()
            .flatten()
        {
            Some(MultiPartPattern::Array(part)) => part,
            other => panic!("expected an array part, got {:?}", other),
        };
        assert_eq!(template, derived);
    }
}
