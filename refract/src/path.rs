//! Dot-separated property paths and their resolution against the metamodel,
//! growing the join graph as association segments are crossed.

use sea_orm::sea_query::{Alias, Expr, SimpleExpr};

use crate::join::{requires_join, JoinGraph, JoinParent};
use crate::metamodel::{AttributeKind, MetamodelProvider};
use crate::types::RefractError;

/// A parsed `a.b.c` property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn parse(raw: &str) -> Result<Self, RefractError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RefractError::InvalidPath {
                path: raw.to_string(),
                reason: "path is empty".into(),
            });
        }
        let segments: Vec<String> = trimmed.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RefractError::InvalidPath {
                path: raw.to_string(),
                reason: "path contains an empty segment".into(),
            });
        }
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// A path resolved down to a concrete `qualifier.column` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Table alias the column is read from: the root table or a join alias.
    pub qualifier: String,
    pub column: String,
}

impl ResolvedColumn {
    pub fn expr(&self) -> SimpleExpr {
        Expr::col((Alias::new(&self.qualifier), Alias::new(&self.column))).into()
    }
}

/// Resolve a property path against the graph's root entity. Association
/// segments create or reuse joins; `for_selection` distinguishes select-list
/// references (which always join through a leaf to-one association) from
/// predicate references (which compare the owner's foreign key column).
pub fn resolve_path(
    path: &PropertyPath,
    for_selection: bool,
    graph: &mut JoinGraph,
    provider: &dyn MetamodelProvider,
) -> Result<ResolvedColumn, RefractError> {
    resolve_from(JoinParent::Root, path, 0, for_selection, graph, provider)
}

fn resolve_from(
    node: JoinParent,
    path: &PropertyPath,
    depth: usize,
    for_selection: bool,
    graph: &mut JoinGraph,
    provider: &dyn MetamodelProvider,
) -> Result<ResolvedColumn, RefractError> {
    let segment = &path.segments()[depth];
    let is_leaf = depth + 1 == path.segments().len();
    let meta = graph.metamodel_of(node);
    let attribute = match meta {
        Some(meta) => match meta.attribute(segment) {
            Some(attr) => Some(attr),
            None => {
                return Err(RefractError::UnknownAttribute {
                    entity: meta.name.to_string(),
                    attribute: segment.clone(),
                })
            }
        },
        // The joined entity never got registered; the plural-parent rule in
        // requires_join still applies.
        None => None,
    };

    if requires_join(attribute, graph.is_plural(node), is_leaf, for_selection) {
        let attribute = attribute.ok_or_else(|| RefractError::UnsupportedTraversal {
            path: path.raw().to_string(),
            reason: format!("segment '{segment}' crosses an unregistered entity"),
        })?;
        let attribute = attribute.clone();
        let idx = graph.get_or_create(node, &attribute, provider, path)?;
        let joined = JoinParent::Node(idx);
        if is_leaf {
            // Selecting the association itself yields its identifier.
            let join = graph.node(idx);
            let column = match join.target {
                Some(target) => target.primary_key_column().to_string(),
                None => join.target_key.to_string(),
            };
            return Ok(ResolvedColumn {
                qualifier: join.alias.clone(),
                column,
            });
        }
        return resolve_from(joined, path, depth + 1, for_selection, graph, provider);
    }

    // No join: the segment maps onto a column of the current table.
    let column = attribute
        .map(|attr| attr.column_name.to_string())
        .unwrap_or_else(|| segment.clone());
    if is_leaf {
        return Ok(ResolvedColumn {
            qualifier: graph.alias_of(node).to_string(),
            column,
        });
    }
    match attribute.map(|attr| attr.kind) {
        Some(AttributeKind::Scalar) => Err(RefractError::UnsupportedTraversal {
            path: path.raw().to_string(),
            reason: format!("cannot traverse into scalar attribute '{segment}'"),
        }),
        // Embedded values flatten into the owning table with underscored
        // column names; an unknown kind gets the same best-effort treatment.
        _ => {
            let mut flattened = column;
            for rest in &path.segments()[depth + 1..] {
                flattened.push('_');
                flattened.push_str(rest);
            }
            Ok(ResolvedColumn {
                qualifier: graph.alias_of(node).to_string(),
                column: flattened,
            })
        }
    }
}
