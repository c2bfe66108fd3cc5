//! Free-text query parser
//!
//! A query is a whitespace-separated list of `path OP value` tokens. Values
//! are coerced using the attribute catalog; anything the parser cannot make
//! sense of degrades to a string-equality predicate instead of failing the
//! query.

use crate::domain::attribute::{Attribute, AttributeKind};
use crate::domain::query::predicate::{CompareOp, Predicate, QueryDomain};
use serde_json::Value;

/// Operators in match order; two-character forms first so `>=` does not
/// split as `>` + `=...`
const OPERATORS: [(&str, CompareOp); 6] = [
    (">=", CompareOp::Gte),
    ("<=", CompareOp::Lte),
    ("!=", CompareOp::Ne),
    ("=", CompareOp::Eq),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
];

/// Parsed query: a conjunction of typed predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    pub predicates: Vec<Predicate>,
}

impl ParsedQuery {
    /// Whether any predicate addresses media report records
    pub fn has_media_predicates(&self) -> bool {
        self.predicates
            .iter()
            .any(|p| matches!(p.domain(), QueryDomain::Rtp | QueryDomain::Rtcp))
    }

    pub fn has_domain(&self, domain: QueryDomain) -> bool {
        self.predicates.iter().any(|p| p.domain() == domain)
    }

    /// Predicates for the SIP index scan: everything except media predicates
    /// and the `sip.method` axis, which is fixed downstream
    pub fn sip_predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter().filter(|p| {
            !matches!(p.domain(), QueryDomain::Rtp | QueryDomain::Rtcp)
                && p.path != "sip.method"
        })
    }

    /// Predicates for the RTPR index scans: everything that is not `sip.*`
    pub fn rtpr_predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates
            .iter()
            .filter(|p| p.domain() != QueryDomain::Sip)
    }
}

/// Parse a raw query string, never failing
pub fn parse(query: &str, attributes: &[Attribute]) -> ParsedQuery {
    let predicates = query
        .split_whitespace()
        .map(|token| parse_token(token, attributes))
        .collect();
    ParsedQuery { predicates }
}

fn parse_token(token: &str, attributes: &[Attribute]) -> Predicate {
    for (symbol, op) in OPERATORS {
        if let Some(at) = token.find(symbol) {
            let path = &token[..at];
            let raw = &token[at + symbol.len()..];
            if path.is_empty() || raw.is_empty() {
                break;
            }
            // `*` in the value means substring match regardless of operator
            if raw.contains('*') {
                return Predicate {
                    path: path.to_string(),
                    op: CompareOp::Contains,
                    value: Value::String(raw.replace('*', "")),
                };
            }
            return Predicate {
                path: path.to_string(),
                op,
                value: coerce(path, raw, attributes),
            };
        }
    }

    // Degraded token: string equality on the raw text
    Predicate {
        path: token.to_string(),
        op: CompareOp::Eq,
        value: Value::String(token.to_string()),
    }
}

/// Coerce the literal to the catalog's type for the path; unknown paths and
/// unparseable literals stay in string space
fn coerce(path: &str, raw: &str, attributes: &[Attribute]) -> Value {
    let kind = attributes
        .iter()
        .find(|a| a.name == path)
        .map(|a| a.kind)
        .unwrap_or(AttributeKind::String);

    match kind {
        AttributeKind::Number => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::from(n)
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::from(f)
            } else {
                Value::String(raw.to_string())
            }
        }
        AttributeKind::Boolean => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        AttributeKind::String => Value::String(raw.to_string()),
    }
}
