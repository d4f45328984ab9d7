//! Boolean predicate trees and the filter compiler.
//!
//! The operator catalog is an enumerated set of operator families; each
//! family has one compile path, so operand arity and quantifier semantics
//! live in exactly one place.

use crate::error::{QueryError, QueryResult};
use crate::plan::ColumnRef;
use crate::resolve::AssociationResolver;
use crate::schema::value::{ColumnType, Value};
use crate::schema::SchemaProvider;
use crate::spec::filter::{Connective, FilterNode, Operand};
use crate::spec::ReportSpec;

/// A compiled boolean predicate over resolved columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// column op value
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
    },
    /// column IN (values...) / NOT IN
    In {
        column: ColumnRef,
        values: Vec<Value>,
        negated: bool,
    },
    /// column LIKE pattern; wildcards are already applied.
    Like { column: ColumnRef, pattern: String },
    /// column BETWEEN low AND high (inclusive) / NOT BETWEEN
    Between {
        column: ColumnRef,
        low: Value,
        high: Value,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Quantifier over a sequence operand: require all or any element match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
}

/// Pattern-match operators; the operand is wrapped with wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    StartsWith,
    EndsWith,
    Contains,
}

/// The operator catalog, tagged by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Compare {
        op: CompareOp,
        negated: bool,
        quantifier: Option<Quantifier>,
    },
    Membership {
        negated: bool,
        quantifier: Option<Quantifier>,
    },
    Pattern(PatternKind),
    Range {
        negated: bool,
    },
}

impl Operator {
    /// Parse a catalog name. Ordering comparisons have negated forms but
    /// no negated quantified forms; equality and membership have both.
    pub fn parse(name: &str) -> Option<Operator> {
        use CompareOp::*;
        use Quantifier::*;
        let compare = |op, negated, quantifier| {
            Some(Operator::Compare {
                op,
                negated,
                quantifier,
            })
        };
        match name {
            "exactly" => compare(Eq, false, None),
            "exactly_all" => compare(Eq, false, Some(All)),
            "exactly_any" => compare(Eq, false, Some(Any)),
            "not_exactly" => compare(Eq, true, None),
            "not_exactly_all" => compare(Eq, true, Some(All)),
            "not_exactly_any" => compare(Eq, true, Some(Any)),

            "less_than" => compare(Lt, false, None),
            "less_than_all" => compare(Lt, false, Some(All)),
            "less_than_any" => compare(Lt, false, Some(Any)),
            "not_less_than" => compare(Lt, true, None),

            "less_than_or_equal_to" => compare(Lte, false, None),
            "less_than_or_equal_to_all" => compare(Lte, false, Some(All)),
            "less_than_or_equal_to_any" => compare(Lte, false, Some(Any)),
            "not_less_than_or_equal_to" => compare(Lte, true, None),

            "greater_than" => compare(Gt, false, None),
            "greater_than_all" => compare(Gt, false, Some(All)),
            "greater_than_any" => compare(Gt, false, Some(Any)),
            "not_greater_than" => compare(Gt, true, None),

            "greater_than_or_equal_to" => compare(Gte, false, None),
            "greater_than_or_equal_to_all" => compare(Gte, false, Some(All)),
            "greater_than_or_equal_to_any" => compare(Gte, false, Some(Any)),
            "not_greater_than_or_equal_to" => compare(Gte, true, None),

            "in" => Some(Operator::Membership {
                negated: false,
                quantifier: None,
            }),
            "in_all" => Some(Operator::Membership {
                negated: false,
                quantifier: Some(All),
            }),
            "in_any" => Some(Operator::Membership {
                negated: false,
                quantifier: Some(Any),
            }),
            "not_in" => Some(Operator::Membership {
                negated: true,
                quantifier: None,
            }),
            "not_in_all" => Some(Operator::Membership {
                negated: true,
                quantifier: Some(All),
            }),
            "not_in_any" => Some(Operator::Membership {
                negated: true,
                quantifier: Some(Any),
            }),

            "starts_with" => Some(Operator::Pattern(PatternKind::StartsWith)),
            "ends_with" => Some(Operator::Pattern(PatternKind::EndsWith)),
            "contains" => Some(Operator::Pattern(PatternKind::Contains)),

            "between" => Some(Operator::Range { negated: false }),
            "not_between" => Some(Operator::Range { negated: true }),

            _ => None,
        }
    }
}

impl Predicate {
    /// AND a list of predicates; a single predicate is returned as-is.
    pub fn and_all(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And(predicates)),
        }
    }

    /// OR a list of predicates; a single predicate is returned as-is.
    pub fn or_all(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::Or(predicates)),
        }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Every column the predicate references, duplicates included.
    pub fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::In { column, .. }
            | Predicate::Like { column, .. }
            | Predicate::Between { column, .. } => out.push(column),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
            Predicate::Not(inner) => inner.collect_columns(out),
        }
    }
}

/// Compile a filter tree into a predicate; vacuous nodes compile to
/// `None`.
pub fn compile_filter<P: SchemaProvider>(
    node: &FilterNode,
    resolver: &mut AssociationResolver<'_, P>,
) -> QueryResult<Option<Predicate>> {
    match node {
        FilterNode::Group {
            connective,
            children,
        } => {
            let mut compiled = Vec::new();
            for child in children {
                if let Some(predicate) = compile_filter(child, resolver)? {
                    compiled.push(predicate);
                }
            }
            Ok(match connective {
                Connective::And => Predicate::and_all(compiled),
                Connective::Or => Predicate::or_all(compiled),
                Connective::Not => Predicate::and_all(compiled).map(Predicate::negate),
            })
        }
        FilterNode::Leaf { key, operators } => compile_leaf(key, operators, resolver),
    }
}

fn compile_leaf<P: SchemaProvider>(
    key: &str,
    operators: &[(String, Operand)],
    resolver: &mut AssociationResolver<'_, P>,
) -> QueryResult<Option<Predicate>> {
    let (column_name, chain) = ReportSpec::parse_key(key)?;
    resolver.resolve(&chain)?;
    let entity = resolver.target_entity(&chain)?;
    let column = ColumnRef {
        table: entity.clone(),
        column: column_name.clone(),
    };
    let column_type = resolver.provider().column_type(&entity, &column_name);

    let mut compiled = Vec::new();
    for (name, operand) in operators {
        let operator = Operator::parse(name)
            .ok_or_else(|| QueryError::UnknownOperator(name.to_string()))?;
        if let Some(predicate) = compile_operator(name, operator, &column, column_type, operand)? {
            compiled.push(predicate);
        }
    }
    Ok(Predicate::and_all(compiled))
}

fn compile_operator(
    name: &str,
    operator: Operator,
    column: &ColumnRef,
    column_type: Option<ColumnType>,
    operand: &Operand,
) -> QueryResult<Option<Predicate>> {
    match operator {
        Operator::Compare {
            op,
            negated,
            quantifier: None,
        } => {
            let value = cast(scalar(name, operand)?.clone(), column_type);
            Ok(Some(negate_if(
                negated,
                Predicate::Compare {
                    column: column.clone(),
                    op,
                    value,
                },
            )))
        }
        Operator::Compare {
            op,
            negated,
            quantifier: Some(quantifier),
        } => {
            let elements = sequence(name, operand)?;
            let mut primitives = Vec::with_capacity(elements.len());
            for element in elements {
                let value = cast(scalar(name, element)?.clone(), column_type);
                primitives.push(negate_if(
                    negated,
                    Predicate::Compare {
                        column: column.clone(),
                        op,
                        value,
                    },
                ));
            }
            Ok(quantify(quantifier, primitives))
        }
        Operator::Membership {
            negated,
            quantifier: None,
        } => {
            let values = value_list(name, sequence(name, operand)?, column_type)?;
            Ok(Some(Predicate::In {
                column: column.clone(),
                values,
                negated,
            }))
        }
        Operator::Membership {
            negated,
            quantifier: Some(quantifier),
        } => {
            let elements = sequence(name, operand)?;
            let mut primitives = Vec::with_capacity(elements.len());
            for element in elements {
                let values = value_list(name, sequence(name, element)?, column_type)?;
                primitives.push(Predicate::In {
                    column: column.clone(),
                    values,
                    negated,
                });
            }
            Ok(quantify(quantifier, primitives))
        }
        Operator::Pattern(kind) => {
            let value = scalar(name, operand)?;
            let text = match value {
                Value::Str(s) => s,
                _ => {
                    return Err(QueryError::invalid_operand(
                        name,
                        "pattern operand must be a string",
                    ))
                }
            };
            let pattern = match kind {
                PatternKind::StartsWith => format!("{}%", text),
                PatternKind::EndsWith => format!("%{}", text),
                PatternKind::Contains => format!("%{}%", text),
            };
            Ok(Some(Predicate::Like {
                column: column.clone(),
                pattern,
            }))
        }
        Operator::Range { negated } => {
            let elements = sequence(name, operand)?;
            if elements.len() != 2 {
                return Err(QueryError::invalid_operand(
                    name,
                    format!("expected [start, end], got {} elements", elements.len()),
                ));
            }
            let low = cast(scalar(name, &elements[0])?.clone(), column_type);
            let high = cast(scalar(name, &elements[1])?.clone(), column_type);
            Ok(Some(Predicate::Between {
                column: column.clone(),
                low,
                high,
                negated,
            }))
        }
    }
}

fn quantify(quantifier: Quantifier, primitives: Vec<Predicate>) -> Option<Predicate> {
    match quantifier {
        Quantifier::All => Predicate::and_all(primitives),
        Quantifier::Any => Predicate::or_all(primitives),
    }
}

fn negate_if(negated: bool, predicate: Predicate) -> Predicate {
    if negated {
        predicate.negate()
    } else {
        predicate
    }
}

/// Operand values are cast with the authoritative column type so they
/// compare against column values the way a SQL backend would coerce them.
fn cast(value: Value, column_type: Option<ColumnType>) -> Value {
    match column_type {
        Some(column_type) => column_type.cast(value),
        None => value,
    }
}

fn scalar<'a>(name: &str, operand: &'a Operand) -> QueryResult<&'a Value> {
    match operand {
        Operand::One(value) => Ok(value),
        Operand::Many(_) => Err(QueryError::invalid_operand(
            name,
            "expected a single value, got a sequence",
        )),
    }
}

fn sequence<'a>(name: &str, operand: &'a Operand) -> QueryResult<&'a [Operand]> {
    match operand {
        Operand::Many(items) => Ok(items),
        Operand::One(_) => Err(QueryError::invalid_operand(
            name,
            "expected a sequence of values",
        )),
    }
}

fn value_list(
    name: &str,
    operands: &[Operand],
    column_type: Option<ColumnType>,
) -> QueryResult<Vec<Value>> {
    operands
        .iter()
        .map(|operand| Ok(cast(scalar(name, operand)?.clone(), column_type)))
        .collect()
}

impl Predicate {
    /// Evaluate against a row-value lookup. Comparisons against
    /// incomparable values (including `Null`) are false, except equality
    /// with `Null`, which tests for absence.
    pub fn evaluate(&self, lookup: &dyn Fn(&ColumnRef) -> Value) -> bool {
        match self {
            Predicate::Compare { column, op, value } => {
                let actual = lookup(column);
                if value.is_null() {
                    return matches!(op, CompareOp::Eq) && actual.is_null();
                }
                match actual.compare(value) {
                    Some(ordering) => match op {
                        CompareOp::Eq => ordering.is_eq(),
                        CompareOp::Lt => ordering.is_lt(),
                        CompareOp::Lte => ordering.is_le(),
                        CompareOp::Gt => ordering.is_gt(),
                        CompareOp::Gte => ordering.is_ge(),
                    },
                    None => false,
                }
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                let actual = lookup(column);
                if actual.is_null() {
                    return false;
                }
                let found = values
                    .iter()
                    .any(|v| actual.compare(v).is_some_and(|o| o.is_eq()));
                found != *negated
            }
            Predicate::Like { column, pattern } => match lookup(column) {
                Value::Str(s) => like_match(pattern, &s),
                _ => false,
            },
            Predicate::Between {
                column,
                low,
                high,
                negated,
            } => {
                let actual = lookup(column);
                if actual.is_null() {
                    return false;
                }
                let inside = actual.compare(low).is_some_and(|o| o.is_ge())
                    && actual.compare(high).is_some_and(|o| o.is_le());
                inside != *negated
            }
            Predicate::And(children) => children.iter().all(|c| c.evaluate(lookup)),
            Predicate::Or(children) => children.iter().any(|c| c.evaluate(lookup)),
            Predicate::Not(inner) => !inner.evaluate(lookup),
        }
    }
}

/// SQL LIKE over `%` wildcards (`_` is not generated by the catalog and is
/// matched literally).
fn like_match(pattern: &str, text: &str) -> bool {
    let segments: Vec<&str> = pattern.split('%').collect();
    match segments.as_slice() {
        [only] => text == *only,
        [first, rest @ ..] => {
            if !text.starts_with(first) {
                return false;
            }
            let mut position = first.len();
            let (last, middle) = match rest.split_last() {
                Some(split) => split,
                None => return true,
            };
            for segment in middle {
                if segment.is_empty() {
                    continue;
                }
                match text[position..].find(segment) {
                    Some(found) => position = position + found + segment.len(),
                    None => return false,
                }
            }
            if last.is_empty() {
                true
            } else {
                text.len() >= position + last.len() && text[position..].ends_with(last)
            }
        }
        [] => text.is_empty(),
    }
}
