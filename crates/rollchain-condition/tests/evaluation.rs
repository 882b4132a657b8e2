//! Integration tests for condition evaluation against parameter maps.

use std::collections::HashMap;

use rollchain_condition::{Combinator, Condition, ConditionError, Value, validate};

fn params(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

struct Case {
    name: &'static str,
    success: bool,
    params: HashMap<String, Value>,
    condition: Condition,
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "present",
            success: true,
            params: params(&[("A", "B".into())]),
            condition: Condition::present("A"),
        },
        Case {
            name: "present_missing",
            success: false,
            params: params(&[("A", "B".into())]),
            condition: Condition::present("C"),
        },
        Case {
            name: "and",
            success: true,
            params: params(&[("A", "B".into()), ("C", "D".into())]),
            condition: Condition::all([Condition::equals("A", "B"), Condition::present("C")]),
        },
        Case {
            name: "and_mismatch",
            success: false,
            params: params(&[("A", "B".into()), ("C", "D".into())]),
            condition: Condition::all([Condition::equals("A", "B"), Condition::equals("C", "E")]),
        },
        Case {
            name: "or",
            success: true,
            params: params(&[("A", "B".into()), ("C", "D".into())]),
            condition: Condition::any([Condition::equals("A", "B"), Condition::equals("F", "G")]),
        },
        Case {
            name: "or_no_match",
            success: false,
            params: params(&[("A", "B".into()), ("C", "D".into())]),
            condition: Condition::any([Condition::equals("A", "N"), Condition::equals("F", "G")]),
        },
        Case {
            name: "xor",
            success: true,
            params: params(&[("A", "B".into()), ("C", "D".into())]),
            condition: Condition::one_of([Condition::present("A"), Condition::equals("F", "G")]),
        },
        Case {
            name: "xor_both_match",
            success: false,
            params: params(&[("A", "B".into()), ("C", "D".into())]),
            condition: Condition::one_of([Condition::equals("A", "B"), Condition::equals("C", "D")]),
        },
        Case {
            name: "empty_string",
            success: false,
            params: params(&[("A", "".into())]),
            condition: Condition::present("A"),
        },
        Case {
            name: "match",
            success: true,
            params: params(&[("A", "ABA".into())]),
            condition: Condition::matches("A", "ABA|CBC"),
        },
        Case {
            name: "match_fail",
            success: false,
            params: params(&[("A", "ABA".into())]),
            condition: Condition::matches("A", "ABAC|CBC"),
        },
        Case {
            name: "match_bad_regex",
            success: false,
            params: params(&[("A", "ABA".into())]),
            condition: Condition::matches("A", "ABA["),
        },
    ]
}

#[test]
fn validation_cases() {
    for case in cases() {
        let result = validate(&case.params, &case.condition);
        assert_eq!(
            case.success,
            result.is_ok(),
            "case '{}' returned {result:?}",
            case.name
        );
    }
}

#[test]
fn and_reports_only_the_failing_branch() -> anyhow::Result<()> {
    let condition = Condition::all([Condition::equals("A", 1), Condition::equals("B", 2)]);

    validate(&params(&[("A", 1.into()), ("B", 2.into())]), &condition)?;

    let err = validate(&params(&[("A", 1.into()), ("B", 3.into())]), &condition)
        .expect_err("B does not match");
    assert_eq!(err.to_string(), "param 'B' did not match expected '2' (3)");
    Ok(())
}

#[test]
fn xor_passes_with_exactly_one_match() {
    let condition = Condition::one_of([Condition::present("A"), Condition::equals("B", "G")]);
    assert!(validate(&params(&[("A", "x".into())]), &condition).is_ok());
}

#[test]
fn xor_with_two_matches_names_both() {
    let condition = Condition::one_of([Condition::present("A"), Condition::equals("B", "G")]);
    let err = validate(&params(&[("A", "x".into()), ("B", "G".into())]), &condition)
        .expect_err("two matches");

    assert!(matches!(err, ConditionError::MultipleXor { ref matched, .. } if matched.len() == 2));
    assert_eq!(err.to_string(), "2+ XOR param(s): A, B -eq 'G'");
}

#[test]
fn xor_with_no_match_aggregates_every_reason() {
    let condition = Condition::one_of([Condition::present("A"), Condition::equals("B", "G")]);
    let err = validate(&params(&[]), &condition).expect_err("no matches");

    assert!(matches!(
        err,
        ConditionError::Aggregate {
            combinator: Combinator::Xor,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "invalid/missing XOR param(s): A, B -eq 'G'\n\tREASON:\n\tmissing param: A\n\tmissing param: B"
    );
}

#[test]
fn or_without_match_lists_both_branches() {
    let condition = Condition::any([Condition::equals("A", "N"), Condition::equals("B", "G")]);
    let err = validate(&params(&[("A", "B".into())]), &condition).expect_err("no branch passes");

    let failures = err.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].description, "A -eq 'N'");
    assert_eq!(
        failures[0].reason.to_string(),
        "param 'A' did not match expected 'N' (B)"
    );
    assert_eq!(failures[1].description, "B -eq 'G'");
    assert_eq!(failures[1].reason.to_string(), "missing param: B");
}

#[test]
fn or_short_circuits_on_first_match() {
    let condition = Condition::any([Condition::equals("A", "N"), Condition::matches("B", "[")]);
    assert!(validate(&params(&[("A", "N".into())]), &condition).is_ok());
}

#[test]
fn motive_is_reported_on_leaf_and_aggregate_errors() {
    let leaf = Condition::present("token").with_motive("api access");
    let err = leaf.validate(&params(&[])).expect_err("missing token");
    assert_eq!(err.to_string(), "missing param: token [motive: api access]");

    let composite = Condition::any([Condition::present("A"), Condition::present("B")])
        .with_motive("need a source");
    let err = composite.validate(&params(&[])).expect_err("no source");
    assert!(
        err.to_string()
            .starts_with("invalid/missing OR param(s): A, B [motive: need a source]")
    );
}
