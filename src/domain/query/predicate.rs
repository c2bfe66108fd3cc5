//! Typed query predicates

use crate::domain::store::Filter;
use serde_json::Value;

/// Comparison operator carried by a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Substring match on a string field
    Contains,
    /// Membership in a value list
    In,
}

/// Record domain addressed by a predicate's dotted path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDomain {
    Sip,
    Rtp,
    Rtcp,
    /// No known prefix; applies to any scanner
    Generic,
}

/// One typed comparison from the query string
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Dotted attribute path, first segment selects the domain
    pub path: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Predicate {
    pub fn domain(&self) -> QueryDomain {
        if self.path.starts_with("sip.") {
            QueryDomain::Sip
        } else if self.path.starts_with("rtp.") {
            QueryDomain::Rtp
        } else if self.path.starts_with("rtcp.") {
            QueryDomain::Rtcp
        } else {
            QueryDomain::Generic
        }
    }

    /// Document field addressed by the path: the domain prefix selects the
    /// collection, the remainder names the field. Generic paths are used
    /// verbatim.
    pub fn field(&self) -> &str {
        match self.domain() {
            QueryDomain::Sip => &self.path["sip.".len()..],
            QueryDomain::Rtp => &self.path["rtp.".len()..],
            QueryDomain::Rtcp => &self.path["rtcp.".len()..],
            QueryDomain::Generic => &self.path,
        }
    }

    pub fn to_filter(&self) -> Filter {
        let field = self.field().to_string();
        match self.op {
            CompareOp::Eq => Filter::Eq(field, self.value.clone()),
            CompareOp::Ne => Filter::Ne(field, self.value.clone()),
            CompareOp::Gt => Filter::Gt(field, self.value.clone()),
            CompareOp::Lt => Filter::Lt(field, self.value.clone()),
            CompareOp::Gte => Filter::Gte(field, self.value.clone()),
            CompareOp::Lte => Filter::Lte(field, self.value.clone()),
            CompareOp::Contains => Filter::Contains(
                field,
                self.value.as_str().unwrap_or_default().to_string(),
            ),
            CompareOp::In => Filter::In(
                field,
                self.value
                    .as_array()
                    .map(|items| items.to_vec())
                    .unwrap_or_default(),
            ),
        }
    }
}
