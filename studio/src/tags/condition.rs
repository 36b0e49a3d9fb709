//! Tag condition trees
//!
//! A condition is either a group (AND/OR/NOT over child conditions) or a leaf
//! comparing one tag against a value. The client only builds and checks the
//! tree; matching happens on the backend.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

use crate::errors::StudioError;

/// A node of the condition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagCondition {
    Group(ConditionGroup),
    Leaf(ConditionLeaf),
}

/// Internal node: a logic operator over children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionGroup {
    pub logic: LogicOperator,
    pub conditions: Vec<TagCondition>,
}

/// Leaf: `tag <operator> value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionLeaf {
    pub tag: String,
    pub operator: TagOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<TagValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagOperator {
    Eq,
    Ne,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Exists,
    NotExists,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl TagOperator {
    fn is_existence(self) -> bool {
        matches!(self, TagOperator::Exists | TagOperator::NotExists)
    }

    fn is_membership(self) -> bool {
        matches!(self, TagOperator::In | TagOperator::NotIn)
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            TagOperator::Gt | TagOperator::Gte | TagOperator::Lt | TagOperator::Lte
        )
    }
}

/// Comparison value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Text(s)
    }
}

impl From<f64> for TagValue {
    fn from(n: f64) -> Self {
        TagValue::Number(n)
    }
}

impl From<i64> for TagValue {
    fn from(n: i64) -> Self {
        TagValue::Number(n as f64)
    }
}

impl From<Vec<String>> for TagValue {
    fn from(v: Vec<String>) -> Self {
        TagValue::List(v)
    }
}

impl From<Vec<&str>> for TagValue {
    fn from(v: Vec<&str>) -> Self {
        TagValue::List(v.into_iter().map(str::to_string).collect())
    }
}

impl TagCondition {
    pub fn group(logic: LogicOperator, conditions: Vec<TagCondition>) -> Self {
        TagCondition::Group(ConditionGroup { logic, conditions })
    }

    pub fn and(conditions: Vec<TagCondition>) -> Self {
        Self::group(LogicOperator::And, conditions)
    }

    pub fn or(conditions: Vec<TagCondition>) -> Self {
        Self::group(LogicOperator::Or, conditions)
    }

    /// NOT always wraps exactly one child
    pub fn negate(condition: TagCondition) -> Self {
        Self::group(LogicOperator::Not, vec![condition])
    }

    pub fn leaf(tag: impl Into<String>, operator: TagOperator, value: Option<TagValue>) -> Self {
        TagCondition::Leaf(ConditionLeaf {
            tag: tag.into(),
            operator,
            value,
        })
    }

    pub fn compare(tag: impl Into<String>, operator: TagOperator, value: impl Into<TagValue>) -> Self {
        Self::leaf(tag, operator, Some(value.into()))
    }

    pub fn equals(tag: impl Into<String>, value: impl Into<TagValue>) -> Self {
        Self::compare(tag, TagOperator::Eq, value)
    }

    pub fn not_equals(tag: impl Into<String>, value: impl Into<TagValue>) -> Self {
        Self::compare(tag, TagOperator::Ne, value)
    }

    pub fn contains(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(tag, TagOperator::Contains, TagValue::Text(value.into()))
    }

    pub fn one_of(tag: impl Into<String>, values: Vec<String>) -> Self {
        Self::compare(tag, TagOperator::In, values)
    }

    pub fn exists(tag: impl Into<String>) -> Self {
        Self::leaf(tag, TagOperator::Exists, None)
    }

    pub fn gt(tag: impl Into<String>, value: f64) -> Self {
        Self::compare(tag, TagOperator::Gt, value)
    }

    pub fn lt(tag: impl Into<String>, value: f64) -> Self {
        Self::compare(tag, TagOperator::Lt, value)
    }

    /// Check the structural rules the backend expects
    pub fn validate(&self) -> Result<(), StudioError> {
        match self {
            TagCondition::Group(group) => {
                match group.logic {
                    LogicOperator::Not if group.conditions.len() != 1 => {
                        return Err(StudioError::InvalidCondition(format!(
                            "NOT takes exactly one condition, got {}",
                            group.conditions.len()
                        )));
                    }
                    _ if group.conditions.is_empty() => {
                        return Err(StudioError::InvalidCondition(format!(
                            "{} group has no conditions",
                            group.logic
                        )));
                    }
                    _ => {}
                }
                group.conditions.iter().try_for_each(TagCondition::validate)
            }
            TagCondition::Leaf(leaf) => leaf.validate(),
        }
    }

    /// Distinct tag names referenced by the tree, in first-seen order
    pub fn tag_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_tags(&mut names);
        names
    }

    fn collect_tags<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TagCondition::Group(group) => {
                for child in &group.conditions {
                    child.collect_tags(names);
                }
            }
            TagCondition::Leaf(leaf) => {
                if !names.contains(&leaf.tag.as_str()) {
                    names.push(leaf.tag.as_str());
                }
            }
        }
    }

    fn combine(self, logic: LogicOperator, other: TagCondition) -> TagCondition {
        let mut conditions = match self {
            TagCondition::Group(group) if group.logic == logic => group.conditions,
            lhs => vec![lhs],
        };
        match other {
            TagCondition::Group(group) if group.logic == logic => {
                conditions.extend(group.conditions)
            }
            rhs => conditions.push(rhs),
        }
        TagCondition::group(logic, conditions)
    }
}

impl ConditionLeaf {
    fn validate(&self) -> Result<(), StudioError> {
        if self.tag.trim().is_empty() {
            return Err(StudioError::InvalidCondition("empty tag name".to_string()));
        }

        let op = self.operator;
        match (&self.value, op) {
            (None, op) if op.is_existence() => Ok(()),
            (Some(_), op) if op.is_existence() => Err(StudioError::InvalidCondition(format!(
                "{:?} on '{}' takes no value",
                op, self.tag
            ))),
            (None, _) => Err(StudioError::InvalidCondition(format!(
                "{:?} on '{}' needs a value",
                op, self.tag
            ))),
            (Some(TagValue::List(_)), op) if op.is_membership() => Ok(()),
            (Some(_), op) if op.is_membership() => Err(StudioError::InvalidCondition(format!(
                "{:?} on '{}' needs a list value",
                op, self.tag
            ))),
            (Some(TagValue::List(_)), _) => Err(StudioError::InvalidCondition(format!(
                "{:?} on '{}' does not accept a list",
                op, self.tag
            ))),
            (Some(TagValue::Text(_)), op) if op.is_ordering() => Err(StudioError::InvalidCondition(
                format!("{:?} on '{}' needs a number", op, self.tag),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicOperator::And => "AND",
            LogicOperator::Or => "OR",
            LogicOperator::Not => "NOT",
        };
        f.write_str(s)
    }
}

impl BitAnd for TagCondition {
    type Output = TagCondition;

    fn bitand(self, rhs: TagCondition) -> TagCondition {
        self.combine(LogicOperator::And, rhs)
    }
}

impl BitOr for TagCondition {
    type Output = TagCondition;

    fn bitor(self, rhs: TagCondition) -> TagCondition {
        self.combine(LogicOperator::Or, rhs)
    }
}

impl Not for TagCondition {
    type Output = TagCondition;

    fn not(self) -> TagCondition {
        TagCondition::negate(self)
    }
}
