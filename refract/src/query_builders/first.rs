//! Lookup of a single entity by predicate, shaped by a projection.

use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::{ConnectionTrait, EntityTrait};

use crate::metamodel::{EntityMetamodel, MetamodelProvider};
use crate::page::Sort;
use crate::predicate::Predicate;
use crate::projection::{ProjectionDescriptor, ProjectionTarget};
use crate::query_builders::tuple::StatementBuilder;
use crate::query_builders::utils::{fetch_entity_models, fetch_tuple_rows};
use crate::row::{materialize_models, materialize_rows};
use crate::types::{ExecutionMetadata, QueryError, RefractError};

/// Builder for `find_one`: at most one match, more than one is an error.
pub struct FirstQueryBuilder<'a, C, E, P>
where
    C: ConnectionTrait,
    E: EntityTrait,
    P: ProjectionTarget<E>,
{
    pub(crate) conn: &'a C,
    pub(crate) provider: &'a (dyn MetamodelProvider + Sync),
    pub(crate) metamodel: &'static EntityMetamodel,
    pub(crate) descriptor: Arc<ProjectionDescriptor>,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) sort: Sort,
    pub(crate) metadata: ExecutionMetadata,
    pub(crate) _phantom: PhantomData<(E, P)>,
}

impl<'a, C, E, P> FirstQueryBuilder<'a, C, E, P>
where
    C: ConnectionTrait,
    E: EntityTrait,
    P: ProjectionTarget<E>,
{
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub async fn exec(self) -> Result<Option<P>, QueryError> {
        let builder = StatementBuilder {
            root: self.metamodel,
            provider: self.provider,
            descriptor: &self.descriptor,
            predicate: self.predicate.as_ref(),
            sort: &self.sort,
            metadata: &self.metadata,
        };

        // Fetch two rows: the second one only exists to detect ambiguity.
        let mut items: Vec<P> = if self.descriptor.requires_entity_load() {
            let models =
                fetch_entity_models::<C, E>(self.conn, &builder, None, Some(2)).await?;
            materialize_models(models, &self.descriptor)?
        } else {
            let mut stmt = builder.build_tuple_select()?;
            stmt.limit(2);
            let rows = fetch_tuple_rows(self.conn, &stmt, "find_one").await?;
            materialize_rows(rows, &self.descriptor)?
        };

        if items.len() > 1 {
            return Err(RefractError::NonUniqueResult {
                entity: self.metamodel.name.to_string(),
            }
            .into());
        }
        Ok(items.pop())
    }
}
