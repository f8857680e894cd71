//! Join planning: decides which path segments need a join and maintains the
//! query's join graph as an indexed arena keyed by `(parent, attribute)`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use sea_orm::sea_query::{Alias, Expr, ExprTrait, JoinType, SelectStatement};

use crate::metamodel::{AttributeKind, AttributeModel, EntityMetamodel, MetamodelProvider};
use crate::path::PropertyPath;
use crate::types::RefractError;

/// Join type per association kind, computed once at process start. A
/// declared-required to-one association could take an inner join, but the
/// observed behavior is preserved: every association joins left outer so the
/// root row survives when the joined side has no matching row.
static ASSOCIATION_JOINS: Lazy<HashMap<AttributeKind, JoinType>> = Lazy::new(|| {
    let mut kinds = HashMap::new();
    kinds.insert(AttributeKind::OneToOne, JoinType::LeftJoin);
    kinds.insert(AttributeKind::ManyToOne, JoinType::LeftJoin);
    kinds.insert(AttributeKind::OneToMany, JoinType::LeftJoin);
    kinds.insert(AttributeKind::ManyToMany, JoinType::LeftJoin);
    kinds.insert(AttributeKind::ElementCollection, JoinType::LeftJoin);
    kinds
});

pub(crate) fn join_type_for(kind: AttributeKind) -> JoinType {
    ASSOCIATION_JOINS
        .get(&kind)
        .copied()
        .unwrap_or(JoinType::LeftJoin)
}

/// Decision table for whether resolving a path segment needs a join.
pub fn requires_join(
    attribute: Option<&AttributeModel>,
    parent_is_plural: bool,
    is_leaf: bool,
    for_selection: bool,
) -> bool {
    let Some(attribute) = attribute else {
        // The metamodel could not resolve the element type eagerly; a plural
        // parent still has to be joined to reach its elements.
        return parent_is_plural;
    };
    if !ASSOCIATION_JOINS.contains_key(&attribute.kind) {
        return false;
    }
    // A leaf to-one reference in a predicate compares the owner's foreign key
    // column directly and needs no join; the same reference in a select list
    // always joins.
    if is_leaf && !for_selection && !attribute.kind.is_collection() {
        return false;
    }
    true
}

/// Position in the join graph a path segment is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinParent {
    Root,
    Node(usize),
}

/// A single left-outer join created against an attribute of its parent node.
#[derive(Debug, Clone)]
pub struct JoinNode {
    pub parent: JoinParent,
    pub attribute: String,
    pub target_table: &'static str,
    /// Unique within the graph; the bare attribute name unless taken.
    pub alias: String,
    pub join_type: JoinType,
    pub owner_key: &'static str,
    pub target_key: &'static str,
    pub target: Option<&'static EntityMetamodel>,
    pub plural: bool,
    /// Seeded from eager-fetch configuration rather than path resolution.
    pub fetched: bool,
}

/// The set of joins for one query, deduplicated by `(parent, attribute)`.
pub struct JoinGraph {
    root: &'static EntityMetamodel,
    root_alias: String,
    nodes: Vec<JoinNode>,
    index: HashMap<(JoinParent, String), usize>,
}

impl JoinGraph {
    pub fn new(root: &'static EntityMetamodel) -> Self {
        Self {
            root,
            root_alias: root.table_name.to_string(),
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    pub fn node(&self, idx: usize) -> &JoinNode {
        &self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alias_of(&self, node: JoinParent) -> &str {
        match node {
            JoinParent::Root => &self.root_alias,
            JoinParent::Node(idx) => &self.nodes[idx].alias,
        }
    }

    pub fn is_plural(&self, node: JoinParent) -> bool {
        match node {
            JoinParent::Root => false,
            JoinParent::Node(idx) => self.nodes[idx].plural,
        }
    }

    pub fn metamodel_of(&self, node: JoinParent) -> Option<&'static EntityMetamodel> {
        match node {
            JoinParent::Root => Some(self.root),
            JoinParent::Node(idx) => self.nodes[idx].target,
        }
    }

    /// True if eager-fetch configuration already covers this attribute under
    /// this parent, so path resolution must not add a second join for it.
    pub fn is_already_fetched(&self, parent: JoinParent, attribute: &str) -> bool {
        self.index
            .get(&(parent, attribute.to_string()))
            .map(|&idx| self.nodes[idx].fetched)
            .unwrap_or(false)
    }

    /// Reuse the existing left join for this attribute under this parent, or
    /// create a new one with a collision-free alias.
    pub fn get_or_create(
        &mut self,
        parent: JoinParent,
        attribute: &AttributeModel,
        provider: &dyn MetamodelProvider,
        path: &PropertyPath,
    ) -> Result<usize, RefractError> {
        if let Some(&idx) = self.index.get(&(parent, attribute.name.to_string())) {
            if matches!(self.nodes[idx].join_type, JoinType::LeftJoin) {
                return Ok(idx);
            }
        }
        let relation = attribute.relation.as_ref().ok_or_else(|| {
            RefractError::UnsupportedTraversal {
                path: path.raw().to_string(),
                reason: format!("attribute '{}' has no relation mapping to join on", attribute.name),
            }
        })?;
        let alias = self.next_alias(attribute.name);
        let idx = self.nodes.len();
        self.nodes.push(JoinNode {
            parent,
            attribute: attribute.name.to_string(),
            target_table: relation.target_table,
            alias,
            join_type: join_type_for(attribute.kind),
            owner_key: relation.owner_key,
            target_key: relation.target_key,
            target: provider.metamodel(relation.target_entity),
            plural: attribute.kind.is_collection(),
            fetched: false,
        });
        self.index.insert((parent, attribute.name.to_string()), idx);
        Ok(idx)
    }

    /// The bare attribute name, unless it already appears as an alias
    /// anywhere in the graph (root alias included); collisions get a
    /// generated disambiguated alias instead.
    fn next_alias(&self, attribute: &str) -> String {
        if !self.has_alias(attribute) {
            return attribute.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{attribute}_{n}");
            if !self.has_alias(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn has_alias(&self, candidate: &str) -> bool {
        self.root_alias == candidate || self.nodes.iter().any(|node| node.alias == candidate)
    }

    /// Pre-create joins for association paths an eager-fetch configuration
    /// already covers, marking them so later resolution reuses them.
    pub fn seed_fetch_paths(
        &mut self,
        paths: &[String],
        provider: &dyn MetamodelProvider,
    ) -> Result<(), RefractError> {
        for raw in paths {
            let path = PropertyPath::parse(raw)?;
            let mut parent = JoinParent::Root;
            for segment in path.segments() {
                let meta = self.metamodel_of(parent).ok_or_else(|| {
                    RefractError::UnsupportedTraversal {
                        path: path.raw().to_string(),
                        reason: "fetch path crosses an unregistered entity".into(),
                    }
                })?;
                let attribute = meta.attribute(segment).ok_or_else(|| {
                    RefractError::UnknownAttribute {
                        entity: meta.name.to_string(),
                        attribute: segment.clone(),
                    }
                })?;
                if !attribute.kind.is_association() {
                    return Err(RefractError::UnsupportedTraversal {
                        path: path.raw().to_string(),
                        reason: format!("fetch path segment '{segment}' is not an association"),
                    });
                }
                let idx = self.get_or_create(parent, attribute, provider, &path)?;
                self.nodes[idx].fetched = true;
                parent = JoinParent::Node(idx);
            }
        }
        Ok(())
    }

    /// Emit the joins into a statement, parents before children.
    pub fn apply_to(&self, stmt: &mut SelectStatement) {
        for node in &self.nodes {
            let parent_alias = self.alias_of(node.parent).to_string();
            stmt.join_as(
                node.join_type,
                Alias::new(node.target_table),
                Alias::new(&node.alias),
                Expr::col((Alias::new(parent_alias), Alias::new(node.owner_key)))
                    .equals((Alias::new(&node.alias), Alias::new(node.target_key))),
            );
        }
    }
}
