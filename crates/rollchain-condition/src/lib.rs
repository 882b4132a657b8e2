//! Precondition trees for task parameters.
//!
//! A [`Condition`] is either a single-key check (presence, equality,
//! inequality or a regex match) or a composite combining child conditions
//! with AND, XOR and OR. Conditions are evaluated against anything that
//! implements [`ParamSource`] and report failures as [`ConditionError`],
//! including aggregate errors that carry the description and reason of every
//! failed branch.

mod condition;
mod error;
mod evaluate;
mod value;

pub use condition::{Combinator, Comparison, Composite, Condition, Leaf};
pub use error::{BranchFailure, ConditionError};
pub use evaluate::validate;
pub use value::{ParamSource, Value};
