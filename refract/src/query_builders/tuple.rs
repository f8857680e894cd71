//! Translates a shape, predicate, sort and execution metadata into
//! `sea_query` statements, sharing one join graph across all of them.

use sea_orm::sea_query::{
    Alias, ConditionalStatement, Expr, OrderedStatement, Query, SelectStatement,
};

use crate::join::JoinGraph;
use crate::metamodel::{EntityMetamodel, MetamodelProvider};
use crate::page::Sort;
use crate::path::{resolve_path, PropertyPath};
use crate::predicate::Predicate;
use crate::projection::ProjectionDescriptor;
use crate::types::{ExecutionMetadata, RefractError};

pub(crate) struct StatementBuilder<'a> {
    pub root: &'static EntityMetamodel,
    pub provider: &'a (dyn MetamodelProvider + Sync),
    pub descriptor: &'a ProjectionDescriptor,
    pub predicate: Option<&'a Predicate>,
    pub sort: &'a Sort,
    pub metadata: &'a ExecutionMetadata,
}

impl<'a> StatementBuilder<'a> {
    /// Build the tuple select for a custom shape: one aliased expression per
    /// field, aliased by the field's source path so row lookup is
    /// independent of select-list order.
    pub fn build_tuple_select(&self) -> Result<SelectStatement, RefractError> {
        self.descriptor.ensure_buildable()?;
        if !self.descriptor.needs_custom_construction() {
            return Err(RefractError::InvalidProjection {
                shape: self.descriptor.shape_name().to_string(),
                message: "shape is materialized from loaded entities, not a tuple select".into(),
            });
        }

        let mut graph = self.new_graph()?;
        let mut stmt = Query::select();
        stmt.from(Alias::new(self.root.table_name));

        // Selections first: they claim the bare attribute names as aliases.
        for field in self.descriptor.fields() {
            let path = PropertyPath::parse(&field.path)?;
            let col = resolve_path(&path, true, &mut graph, self.provider)?;
            stmt.expr_as(col.expr(), Alias::new(&field.path));
        }

        self.apply_predicate(&mut stmt, &mut graph)?;
        self.apply_sort(&mut stmt, &mut graph)?;
        graph.apply_to(&mut stmt);
        self.apply_lock(&mut stmt);
        Ok(stmt)
    }

    /// Build the count query for the same predicate. Fetch paths are left
    /// out: they widen the row set without changing the count, and the
    /// count query carries neither sort nor lock.
    pub fn build_count(&self) -> Result<SelectStatement, RefractError> {
        let mut graph = JoinGraph::new(self.root);
        let mut stmt = Query::select();
        stmt.from(Alias::new(self.root.table_name));
        stmt.expr_as(
            Expr::col((
                Alias::new(self.root.table_name),
                Alias::new(self.root.primary_key_column()),
            ))
            .count(),
            Alias::new("count"),
        );
        self.apply_predicate(&mut stmt, &mut graph)?;
        graph.apply_to(&mut stmt);
        Ok(stmt)
    }

    /// Decorate a statement produced by the plain entity finder with this
    /// builder's predicate, sort, fetch joins and lock.
    pub fn apply_to_entity_query(&self, stmt: &mut SelectStatement) -> Result<(), RefractError> {
        let mut graph = self.new_graph()?;
        self.apply_predicate(stmt, &mut graph)?;
        self.apply_sort(stmt, &mut graph)?;
        graph.apply_to(stmt);
        self.apply_lock(stmt);
        Ok(())
    }

    fn new_graph(&self) -> Result<JoinGraph, RefractError> {
        let mut graph = JoinGraph::new(self.root);
        graph.seed_fetch_paths(&self.metadata.fetch_paths, self.provider)?;
        Ok(graph)
    }

    fn apply_predicate(
        &self,
        stmt: &mut SelectStatement,
        graph: &mut JoinGraph,
    ) -> Result<(), RefractError> {
        if let Some(predicate) = self.predicate {
            let cond = predicate.to_condition(graph, self.provider)?;
            stmt.cond_where(cond);
        }
        Ok(())
    }

    fn apply_sort(
        &self,
        stmt: &mut SelectStatement,
        graph: &mut JoinGraph,
    ) -> Result<(), RefractError> {
        for spec in self.sort.iter() {
            let path = PropertyPath::parse(&spec.path)?;
            let col = resolve_path(&path, false, graph, self.provider)?;
            stmt.order_by_expr(col.expr(), spec.order.into_order());
        }
        Ok(())
    }

    fn apply_lock(&self, stmt: &mut SelectStatement) {
        if let Some(lock) = self.metadata.lock {
            stmt.lock(lock.lock_type());
        }
    }
}
