//! Lookup of a single entity by identifier, shaped by a projection.

use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::sea_query::Value;
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::metamodel::{EntityMetamodel, MetamodelProvider};
use crate::page::Sort;
use crate::predicate::Predicate;
use crate::projection::{ProjectionDescriptor, ProjectionTarget};
use crate::query_builders::tuple::StatementBuilder;
use crate::query_builders::utils::{fetch_entity_models, fetch_tuple_rows};
use crate::row::{materialize_models, ProjectedRow};
use crate::types::{ExecutionMetadata, QueryError};

/// Builder for `find_by_id`: primary-key equality, at most one row.
pub struct UniqueQueryBuilder<'a, C, E, P>
where
    C: ConnectionTrait,
    E: EntityTrait,
    P: ProjectionTarget<E>,
{
    pub(crate) conn: &'a C,
    pub(crate) provider: &'a (dyn MetamodelProvider + Sync),
    pub(crate) metamodel: &'static EntityMetamodel,
    pub(crate) descriptor: Arc<ProjectionDescriptor>,
    pub(crate) id: Value,
    pub(crate) metadata: ExecutionMetadata,
    pub(crate) _phantom: PhantomData<(E, P)>,
}

impl<'a, C, E, P> UniqueQueryBuilder<'a, C, E, P>
where
    C: ConnectionTrait,
    E: EntityTrait,
    P: ProjectionTarget<E>,
{
    pub async fn exec(self) -> Result<Option<P>, QueryError> {
        let predicate = Predicate::equals(self.metamodel.primary_key, self.id);
        let sort = Sort::unsorted();
        let builder = StatementBuilder {
            root: self.metamodel,
            provider: self.provider,
            descriptor: &self.descriptor,
            predicate: Some(&predicate),
            sort: &sort,
            metadata: &self.metadata,
        };

        if self.descriptor.requires_entity_load() {
            let models =
                fetch_entity_models::<C, E>(self.conn, &builder, None, Some(1)).await?;
            let mut items: Vec<P> = materialize_models(models, &self.descriptor)?;
            return Ok(items.pop());
        }

        let mut stmt = builder.build_tuple_select()?;
        stmt.limit(1);
        let rows = fetch_tuple_rows(self.conn, &stmt, "find_by_id").await?;
        rows.into_iter()
            .next()
            .map(|row| P::from_projected_row(ProjectedRow::new(row, self.descriptor.clone())))
            .transpose()
    }
}
