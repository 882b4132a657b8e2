use std::fmt;

use serde::Deserialize;

use crate::error::ConditionError;
use crate::evaluate;
use crate::value::{ParamSource, Value};

/// How a leaf compares the parameter against its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Comparison {
    #[default]
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "ne")]
    NotEqual,
    #[serde(rename = "m", alias = "match")]
    Match,
}

impl Comparison {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "ne",
            Self::Match => "m",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean combinator joining the children of a composite condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Xor,
    Or,
}

impl Combinator {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Xor => "⊕",
            Self::Or => "||",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Or => "OR",
        })
    }
}

/// A check on a single parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Leaf {
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub comparison: Comparison,
    #[serde(default)]
    pub motive: Option<String>,
}

impl Leaf {
    /// The value the parameter is compared against. An expected
    /// [`Value::Null`] counts as no expected value.
    #[must_use]
    pub fn expected(&self) -> Option<&Value> {
        self.value.as_ref().filter(|value| !value.is_null())
    }
}

/// Children combined by AND, then XOR, then OR.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Composite {
    #[serde(default)]
    pub and: Vec<Condition>,
    #[serde(default)]
    pub xor: Vec<Condition>,
    #[serde(default)]
    pub or: Vec<Condition>,
    #[serde(default)]
    pub motive: Option<String>,
}

impl Composite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.and.push(condition);
        self
    }

    #[must_use]
    pub fn xor(mut self, condition: Condition) -> Self {
        self.xor.push(condition);
        self
    }

    #[must_use]
    pub fn or(mut self, condition: Condition) -> Self {
        self.or.push(condition);
        self
    }

    #[must_use]
    pub fn build(self) -> Condition {
        Condition::Composite(self)
    }
}

/// A predicate tree gating whether a task may run.
///
/// The default condition always passes.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    #[default]
    #[serde(skip)]
    Always,
    Leaf(Leaf),
    Composite(Composite),
}

impl Condition {
    fn leaf(key: impl Into<String>, value: Option<Value>, comparison: Comparison) -> Self {
        Self::Leaf(Leaf {
            key: key.into(),
            value,
            comparison,
            motive: None,
        })
    }

    /// Passes when `key` is set to a non-null, non-empty value.
    #[must_use]
    pub fn present(key: impl Into<String>) -> Self {
        Self::leaf(key, None, Comparison::Equal)
    }

    /// Passes when `key` is set to exactly `value`.
    #[must_use]
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(key, Some(value.into()), Comparison::Equal)
    }

    /// Passes when `key` is not set at all.
    #[must_use]
    pub fn absent(key: impl Into<String>) -> Self {
        Self::leaf(key, None, Comparison::NotEqual)
    }

    /// Passes when `key` is absent or set to something other than `value`.
    #[must_use]
    pub fn not_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(key, Some(value.into()), Comparison::NotEqual)
    }

    /// Passes when the string value of `key` matches the regex `pattern`.
    #[must_use]
    pub fn matches(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::leaf(key, Some(Value::String(pattern.into())), Comparison::Match)
    }

    /// Every child must pass.
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Composite(Composite {
            and: conditions.into_iter().collect(),
            ..Composite::default()
        })
    }

    /// Exactly one child must pass.
    #[must_use]
    pub fn one_of(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Composite(Composite {
            xor: conditions.into_iter().collect(),
            ..Composite::default()
        })
    }

    /// At least one child must pass.
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Composite(Composite {
            or: conditions.into_iter().collect(),
            ..Composite::default()
        })
    }

    /// Annotates the condition with a reason that is appended to its
    /// description and to every error it produces. No-op on [`Condition::Always`].
    #[must_use]
    pub fn with_motive(mut self, motive: impl Into<String>) -> Self {
        match &mut self {
            Self::Always => {}
            Self::Leaf(leaf) => leaf.motive = Some(motive.into()),
            Self::Composite(composite) => composite.motive = Some(motive.into()),
        }
        self
    }

    #[must_use]
    pub fn motive(&self) -> Option<&str> {
        match self {
            Self::Always => None,
            Self::Leaf(leaf) => leaf.motive.as_deref(),
            Self::Composite(composite) => composite.motive.as_deref(),
        }
    }

    /// Evaluates the condition against `params`.
    ///
    /// # Errors
    ///
    /// Returns the reason the condition is not satisfied.
    pub fn validate<P: ParamSource + ?Sized>(&self, params: &P) -> Result<(), ConditionError> {
        evaluate::validate(params, self)
    }

    /// Renders the condition as a stable, human-readable expression.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Always => out.push_str("always"),
            Self::Leaf(leaf) => {
                out.push_str(&leaf.key);
                if let Some(value) = leaf.expected() {
                    out.push_str(&format!(" -{} '{value}'", leaf.comparison));
                }
            }
            Self::Composite(composite) => {
                out.push('(');
                let lists = [
                    (Combinator::And, &composite.and),
                    (Combinator::Xor, &composite.xor),
                    (Combinator::Or, &composite.or),
                ];
                let mut first = true;
                for (combinator, children) in lists {
                    for child in children {
                        if !first {
                            out.push(' ');
                            out.push_str(combinator.symbol());
                        }
                        first = false;
                        out.push(' ');
                        out.push_str(&child.describe());
                    }
                }
                out.push_str(" )");
            }
        }
        out.push_str(&motive_suffix(self.motive()));
        out
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

pub(crate) fn motive_suffix(motive: Option<&str>) -> String {
    motive.map_or_else(String::new, |m| format!(" [motive: {m}]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_leaf_without_value_is_just_the_key() {
        assert_eq!(Condition::present("A").describe(), "A");
    }

    #[test]
    fn describe_leaf_renders_operator_and_value() {
        assert_eq!(Condition::equals("A", "B").describe(), "A -eq 'B'");
        assert_eq!(Condition::not_equals("A", 3).describe(), "A -ne '3'");
        assert_eq!(
            Condition::matches("A", "ABA|CBC").describe(),
            "A -m 'ABA|CBC'"
        );
    }

    #[test]
    fn describe_appends_motive() {
        let condition = Condition::present("token").with_motive("needed to authenticate");
        assert_eq!(
            condition.describe(),
            "token [motive: needed to authenticate]"
        );
    }

    #[test]
    fn describe_composite_joins_each_list_with_its_symbol() {
        let condition = Composite::new()
            .and(Condition::present("A"))
            .and(Condition::present("B"))
            .xor(Condition::equals("C", "D"))
            .or(Condition::present("E"))
            .build();

        assert_eq!(condition.describe(), "( A && B ⊕ C -eq 'D' || E )");
    }

    #[test]
    fn describe_nested_composite() {
        let condition = Condition::any([
            Condition::all([Condition::present("A"), Condition::present("B")]),
            Condition::present("C"),
        ])
        .with_motive("m");

        assert_eq!(condition.describe(), "( ( A && B ) || C ) [motive: m]");
    }

    #[test]
    fn default_condition_always_passes_and_has_no_motive() {
        let condition = Condition::default().with_motive("ignored");
        assert_eq!(condition, Condition::Always);
        assert_eq!(condition.motive(), None);
        assert_eq!(condition.describe(), "always");
    }

    #[test]
    fn leaf_deserializes_from_toml() -> anyhow::Result<()> {
        let condition: Condition =
            toml::from_str("key = \"env\"\nvalue = \"prod|staging\"\ncomparison = \"match\"\n")?;
        assert_eq!(condition, Condition::matches("env", "prod|staging"));
        Ok(())
    }

    #[test]
    fn composite_deserializes_from_toml() -> anyhow::Result<()> {
        let source = r#"
motive = "one credential"
xor = [{ key = "token" }, { key = "password" }]
"#;
        let condition: Condition = toml::from_str(source)?;
        assert_eq!(
            condition,
            Condition::one_of([Condition::present("token"), Condition::present("password")])
                .with_motive("one credential")
        );
        Ok(())
    }
}
