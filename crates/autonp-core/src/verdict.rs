//! Filter thresholds and admission verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Attribute, SourceTag};

/// Comparison applied between an attribute value and its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// value > threshold
    Gt,
    /// value >= threshold
    Ge,
    /// value <= threshold
    Le,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }
}

/// One configured admission threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub attribute: Attribute,
    pub operator: Operator,
    pub value: f64,
}

impl Threshold {
    pub fn new(attribute: Attribute, operator: Operator, value: f64) -> Self {
        Self {
            attribute,
            operator,
            value,
        }
    }

    /// Whether `v` satisfies this threshold. NaN never does.
    pub fn admits(&self, v: f64) -> bool {
        match self.operator {
            Operator::Gt => v > self.value,
            Operator::Ge => v >= self.value,
            Operator::Le => v <= self.value,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator.symbol(), self.value)
    }
}

/// Why a record was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum RejectReason {
    BelowThreshold(Attribute),
    MissingField(Attribute),
    MalformedValue(Attribute),
}

impl RejectReason {
    pub fn field(&self) -> Attribute {
        match self {
            RejectReason::BelowThreshold(a)
            | RejectReason::MissingField(a)
            | RejectReason::MalformedValue(a) => *a,
        }
    }

    /// Report label, e.g. `below_threshold(oral_bioavailability)`.
    pub fn label(&self) -> String {
        let kind = match self {
            RejectReason::BelowThreshold(_) => "below_threshold",
            RejectReason::MissingField(_) => "missing_field",
            RejectReason::MalformedValue(_) => "malformed_value",
        };
        format!("{}({})", kind, self.field())
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Per-record admission decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterVerdict {
    pub source: SourceTag,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    pub thresholds_applied: Vec<Threshold>,
}

impl FilterVerdict {
    pub fn accept(source: SourceTag, thresholds_applied: Vec<Threshold>) -> Self {
        Self {
            source,
            accepted: true,
            reason: None,
            thresholds_applied,
        }
    }

    pub fn reject(source: SourceTag, reason: RejectReason, thresholds_applied: Vec<Threshold>) -> Self {
        Self {
            source,
            accepted: false,
            reason: Some(reason),
            thresholds_applied,
        }
    }
}
