//! Composable predicate trees translated into `sea_query` conditions.

use sea_orm::sea_query::{Condition, ExprTrait, Value};

use crate::join::JoinGraph;
use crate::metamodel::MetamodelProvider;
use crate::path::{resolve_path, PropertyPath};
use crate::types::RefractError;

/// Comparison applied to a single resolved property path.
#[derive(Debug, Clone)]
pub enum FieldOp {
    Equals(Value),
    NotEquals(Value),
    Gt(Value),
    Lt(Value),
    Gte(Value),
    Lte(Value),
    InVec(Vec<Value>),
    NotInVec(Vec<Value>),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    IsNull,
    IsNotNull,
}

/// A predicate over entity property paths. Paths may traverse associations;
/// the translation step plans the joins they need.
#[derive(Debug, Clone)]
pub enum Predicate {
    Field { path: String, op: FieldOp },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    fn field(path: impl Into<String>, op: FieldOp) -> Self {
        Predicate::Field {
            path: path.into(),
            op,
        }
    }

    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(path, FieldOp::Equals(value.into()))
    }

    pub fn not_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(path, FieldOp::NotEquals(value.into()))
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(path, FieldOp::Gt(value.into()))
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(path, FieldOp::Lt(value.into()))
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(path, FieldOp::Gte(value.into()))
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(path, FieldOp::Lte(value.into()))
    }

    pub fn in_vec(path: impl Into<String>, values: Vec<impl Into<Value>>) -> Self {
        Self::field(
            path,
            FieldOp::InVec(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn not_in_vec(path: impl Into<String>, values: Vec<impl Into<Value>>) -> Self {
        Self::field(
            path,
            FieldOp::NotInVec(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn contains(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field(path, FieldOp::Contains(value.into()))
    }

    pub fn starts_with(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field(path, FieldOp::StartsWith(value.into()))
    }

    pub fn ends_with(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field(path, FieldOp::EndsWith(value.into()))
    }

    pub fn is_null(path: impl Into<String>) -> Self {
        Self::field(path, FieldOp::IsNull)
    }

    pub fn is_not_null(path: impl Into<String>) -> Self {
        Self::field(path, FieldOp::IsNotNull)
    }

    pub fn and(predicates: Vec<Predicate>) -> Self {
        Predicate::And(predicates)
    }

    pub fn or(predicates: Vec<Predicate>) -> Self {
        Predicate::Or(predicates)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not(Box::new(predicate))
    }

    /// Translate into a condition, resolving paths against the root entity
    /// and planning joins into `graph` as association segments are crossed.
    pub(crate) fn to_condition(
        &self,
        graph: &mut JoinGraph,
        provider: &dyn MetamodelProvider,
    ) -> Result<Condition, RefractError> {
        match self {
            Predicate::Field { path, op } => {
                let parsed = PropertyPath::parse(path)?;
                let col = resolve_path(&parsed, false, graph, provider)?;
                let expr = col.expr();
                let applied = match op {
                    FieldOp::Equals(v) => expr.eq(v.clone()),
                    FieldOp::NotEquals(v) => expr.ne(v.clone()),
                    FieldOp::Gt(v) => expr.gt(v.clone()),
                    FieldOp::Lt(v) => expr.lt(v.clone()),
                    FieldOp::Gte(v) => expr.gte(v.clone()),
                    FieldOp::Lte(v) => expr.lte(v.clone()),
                    FieldOp::InVec(vs) => expr.is_in(vs.clone()),
                    FieldOp::NotInVec(vs) => expr.is_not_in(vs.clone()),
                    FieldOp::Contains(s) => expr.like(format!("%{s}%")),
                    FieldOp::StartsWith(s) => expr.like(format!("{s}%")),
                    FieldOp::EndsWith(s) => expr.like(format!("%{s}")),
                    FieldOp::IsNull => expr.is_null(),
                    FieldOp::IsNotNull => expr.is_not_null(),
                };
                Ok(Condition::all().add(applied))
            }
            Predicate::And(children) => {
                let mut cond = Condition::all();
                for child in children {
                    cond = cond.add(child.to_condition(graph, provider)?);
                }
                Ok(cond)
            }
            Predicate::Or(children) => {
                let mut cond = Condition::any();
                for child in children {
                    cond = cond.add(child.to_condition(graph, provider)?);
                }
                Ok(cond)
            }
            Predicate::Not(inner) => Ok(inner.to_condition(graph, provider)?.not()),
        }
    }
}
