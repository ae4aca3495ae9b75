//! End-to-end properties of the pattern engine: generate-then-match
//! round-trips, optionality handling, diff aggregation, and cycle
//! termination, all through the public API.

use std::io::Write;

use accord_core::{
    difference, find_differences, CompatibilityReport, Contract, ContentPart, FailureReason,
    MultiPartPattern, Pattern, PatternError, Row, Value,
};

fn upload_contract() -> Contract {
    let mut contract = Contract::new("customer-upload");
    contract.body = Some(Pattern::lookup("Customer"));
    contract.types.insert("Customer", Pattern::String);
    contract.multipart = vec![
        MultiPartPattern::Content(ContentPart::new("id", Pattern::Number)),
        MultiPartPattern::Content(ContentPart::new("address?", Pattern::String)),
        MultiPartPattern::Array(accord_core::ArrayPart::new("tags", Pattern::String)),
    ];
    contract
}

#[test]
fn every_generated_part_matches_its_own_pattern() {
    let contract = upload_contract();
    let resolver = contract.resolver();
    let row = Row::from_pairs([("tags", "[\"a\",\"b\"]")]);

    for part in &contract.multipart {
        for variant in part.new_variants(&row, &resolver).unwrap().into_iter().flatten() {
            for value in variant.generate(&resolver).unwrap() {
                assert!(
                    variant.matches(&value, &resolver).unwrap().is_success(),
                    "generated {:?} should match {:?}",
                    value,
                    variant
                );
            }
        }
    }

    let body = contract.body.as_ref().unwrap();
    let generated = body.generate(&resolver).unwrap();
    assert!(body.matches(&generated, &resolver).unwrap().is_success());
}

#[test]
fn omitted_variant_leads_and_the_rest_equals_the_required_sequence() {
    let contract = upload_contract();
    let resolver = contract.resolver();
    let optional = ContentPart::new("address?", Pattern::String);
    let required = ContentPart::new("address", Pattern::String);

    let optional_variants = optional.new_variants(&Row::new(), &resolver).unwrap();
    let required_variants = required.new_variants(&Row::new(), &resolver).unwrap();

    assert!(optional_variants[0].is_none());
    assert_eq!(optional_variants[1..], required_variants[..]);
}

#[test]
fn part_name_mismatch_wins_over_content_compatibility() {
    let contract = upload_contract();
    let resolver = contract.resolver();
    let part = ContentPart::new("id", Pattern::Number);

    let value = Value::MultiPartContent {
        name: "other".into(),
        content: Box::new(Value::String("42".into())),
        content_type: None,
    };
    let failure = part
        .matches(&value, &resolver)
        .unwrap()
        .into_failure()
        .unwrap();
    assert_eq!(failure.reason, Some(FailureReason::PartNameMismatch));
}

#[test]
fn diffing_a_contract_against_itself_finds_nothing() {
    let contract = upload_contract();
    let results = find_differences(&contract, &contract.clone()).unwrap();
    assert_eq!(results.failure_count(), 0);
}

#[test]
fn making_an_optional_part_required_raises_the_failure_count() {
    let older = upload_contract();
    let mut newer = upload_contract();
    newer.multipart[1] = MultiPartPattern::Content(ContentPart::new("address", Pattern::String));

    let baseline = find_differences(&older, &older.clone()).unwrap().failure_count();
    let results = find_differences(&older, &newer).unwrap();
    assert!(results.failure_count() >= baseline + 1);
    assert!(results
        .failures
        .iter()
        .any(|failure| failure.breadcrumb_path().starts_with("address")));
}

#[test]
fn self_referential_contracts_terminate_everywhere() {
    let mut contract = Contract::new("recursive");
    contract.body = Some(Pattern::lookup("Tree"));
    contract.types.insert("Tree", Pattern::lookup("Tree"));
    let resolver = contract.resolver();

    let body = contract.body.as_ref().unwrap();
    // Generation substitutes a terminating placeholder.
    assert_eq!(body.generate(&resolver).unwrap(), Value::Null);
    // Matching terminates too.
    assert!(body
        .matches(&Value::String("x".into()), &resolver)
        .unwrap()
        .is_success());
    // And diffing reports the two versions as compatible.
    let results = find_differences(&contract, &contract.clone()).unwrap();
    assert_eq!(results.failure_count(), 0);
}

#[test]
fn exact_file_parts_compare_bytes_and_surface_missing_files() {
    let mut reference = tempfile::NamedTempFile::new().unwrap();
    reference.write_all(b"ledger-v1").unwrap();
    let path = reference.path().to_string_lossy().into_owned();

    let part = accord_core::FilePart::new("ledger", Pattern::exact(Value::String(path.clone())));
    let registry = accord_core::PatternRegistry::new();
    let resolver = accord_core::Resolver::new(&registry);

    // Generation reads the reference bytes, so the round trip holds.
    let values = MultiPartPattern::File(part.clone())
        .generate(&resolver)
        .unwrap();
    assert!(part.matches(&values[0], &resolver).unwrap().is_success());

    let tampered = Value::MultiPartFile {
        name: "ledger".into(),
        filename: path,
        content: b"ledger-v2".to_vec(),
        content_type: None,
        content_encoding: None,
    };
    let failure = part
        .matches(&tampered, &resolver)
        .unwrap()
        .into_failure()
        .unwrap();
    assert_eq!(failure.reason, Some(FailureReason::PartNameMismatch));
    assert!(failure.cause.is_some());

    let orphan =
        accord_core::FilePart::new("ledger", Pattern::exact(Value::String("/no/such/file".into())));
    assert!(matches!(
        orphan.matches(&tampered, &resolver),
        Err(PatternError::MissingReferenceFile { .. })
    ));
}

#[test]
fn reports_flow_from_interchange_json() {
    let older = upload_contract();
    let mut newer = upload_contract();
    newer.multipart.push(MultiPartPattern::Content(ContentPart::new(
        "signature",
        Pattern::String,
    )));

    let older = Contract::from_json(&older.to_json().unwrap()).unwrap();
    let newer = Contract::from_json(&newer.to_json().unwrap()).unwrap();

    let report = difference(&older, &newer);
    assert!(matches!(report, CompatibilityReport::Incompatible { .. }));
    assert_eq!(report.exit_code(), 1);
    assert!(report.message().contains("signature"));
}
