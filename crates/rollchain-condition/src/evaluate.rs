use regex::Regex;

use crate::condition::{Combinator, Comparison, Composite, Condition, Leaf};
use crate::error::{BranchFailure, ConditionError};
use crate::value::{ParamSource, Value};

/// Evaluates `condition` against `params`.
///
/// Composites evaluate their AND children first, then XOR, then OR; the first
/// stage that fails decides the error.
///
/// # Errors
///
/// Returns the first reason the condition is not satisfied. XOR and OR stages
/// without a passing child report every branch in a
/// [`ConditionError::Aggregate`].
pub fn validate<P: ParamSource + ?Sized>(
    params: &P,
    condition: &Condition,
) -> Result<(), ConditionError> {
    match condition {
        Condition::Always => Ok(()),
        Condition::Leaf(leaf) => validate_leaf(params, leaf),
        Condition::Composite(composite) => validate_composite(params, composite),
    }
}

fn validate_leaf<P: ParamSource + ?Sized>(params: &P, leaf: &Leaf) -> Result<(), ConditionError> {
    let key = leaf.key.clone();
    let motive = leaf.motive.clone();
    let actual = params.param(&leaf.key);

    if leaf.comparison == Comparison::NotEqual {
        return match (actual, leaf.expected()) {
            (None, _) => Ok(()),
            (Some(_), None) => Err(ConditionError::Unexpected { key, motive }),
            (Some(actual), Some(expected)) if actual == expected => {
                Err(ConditionError::InequalityMatched {
                    key,
                    expected: expected.clone(),
                    actual: actual.clone(),
                    motive,
                })
            }
            (Some(_), Some(_)) => Ok(()),
        };
    }

    let actual = match actual {
        None | Some(Value::Null) => return Err(ConditionError::MissingParam { key, motive }),
        Some(Value::String(s)) if s.is_empty() => {
            return Err(ConditionError::EmptyParam { key, motive });
        }
        Some(actual) => actual,
    };

    let Some(expected) = leaf.expected() else {
        return Ok(());
    };

    match leaf.comparison {
        Comparison::Match => {
            let pattern = expected.to_string();
            let regex = Regex::new(&pattern).map_err(|source| ConditionError::InvalidPattern {
                key: key.clone(),
                pattern: pattern.clone(),
                motive: motive.clone(),
                source,
            })?;
            let Some(text) = actual.as_str() else {
                return Err(ConditionError::NotText {
                    key,
                    pattern,
                    actual: actual.clone(),
                    motive,
                });
            };
            if regex.is_match(text) {
                Ok(())
            } else {
                Err(ConditionError::PatternMismatch {
                    key,
                    pattern,
                    actual: text.to_string(),
                    motive,
                })
            }
        }
        Comparison::Equal | Comparison::NotEqual => {
            if actual == expected {
                Ok(())
            } else {
                Err(ConditionError::Mismatch {
                    key,
                    expected: expected.clone(),
                    actual: actual.clone(),
                    motive,
                })
            }
        }
    }
}

fn validate_composite<P: ParamSource + ?Sized>(
    params: &P,
    composite: &Composite,
) -> Result<(), ConditionError> {
    for child in &composite.and {
        validate(params, child)?;
    }

    if !composite.xor.is_empty() {
        validate_xor(params, composite)?;
    }

    if !composite.or.is_empty() {
        validate_or(params, composite)?;
    }

    Ok(())
}

fn validate_xor<P: ParamSource + ?Sized>(
    params: &P,
    composite: &Composite,
) -> Result<(), ConditionError> {
    let mut matched = Vec::new();
    let mut failures = Vec::new();

    for child in &composite.xor {
        match validate(params, child) {
            Ok(()) => {
                matched.push(child.describe());
                if matched.len() > 1 {
                    return Err(ConditionError::MultipleXor {
                        matched,
                        motive: composite.motive.clone(),
                    });
                }
            }
            Err(reason) => failures.push(BranchFailure {
                description: child.describe(),
                reason,
            }),
        }
    }

    if matched.is_empty() {
        return Err(ConditionError::Aggregate {
            combinator: Combinator::Xor,
            failures,
            motive: composite.motive.clone(),
        });
    }
    Ok(())
}

fn validate_or<P: ParamSource + ?Sized>(
    params: &P,
    composite: &Composite,
) -> Result<(), ConditionError> {
    let mut failures = Vec::with_capacity(composite.or.len());

    for child in &composite.or {
        match validate(params, child) {
            Ok(()) => return Ok(()),
            Err(reason) => failures.push(BranchFailure {
                description: child.describe(),
                reason,
            }),
        }
    }

    Err(ConditionError::Aggregate {
        combinator: Combinator::Or,
        failures,
        motive: composite.motive.clone(),
    })
}
