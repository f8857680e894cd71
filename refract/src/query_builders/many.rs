//! Paged listing of entities by predicate, shaped by a projection.

use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::{ConnectionTrait, EntityTrait};

use crate::metamodel::{EntityMetamodel, MetamodelProvider};
use crate::page::{deduced_total, Page, PageRequest};
use crate::predicate::Predicate;
use crate::projection::{ProjectionDescriptor, ProjectionTarget};
use crate::query_builders::count::CountQueryBuilder;
use crate::query_builders::tuple::StatementBuilder;
use crate::query_builders::utils::{fetch_entity_models, fetch_tuple_rows};
use crate::row::{materialize_models, materialize_rows};
use crate::types::{ExecutionMetadata, QueryError};

/// Builder for `find_all`: fetches one page and resolves the total count,
/// skipping the count query whenever the fetched page pins the total.
pub struct ManyQueryBuilder<'a, C, E, P>
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
    pub(crate) request: PageRequest,
    pub(crate) metadata: ExecutionMetadata,
    pub(crate) _phantom: PhantomData<(E, P)>,
}

impl<'a, C, E, P> ManyQueryBuilder<'a, C, E, P>
where
    C: ConnectionTrait,
    E: EntityTrait,
    P: ProjectionTarget<E>,
{
    pub fn page(mut self, request: PageRequest) -> Self {
        self.request = request;
        self
    }

    pub async fn exec(self) -> Result<Page<P>, QueryError> {
        let builder = StatementBuilder {
            root: self.metamodel,
            provider: self.provider,
            descriptor: &self.descriptor,
            predicate: self.predicate.as_ref(),
            sort: self.request.sort(),
            metadata: &self.metadata,
        };
        let bounds = self.request.bounds();

        let items: Vec<P> = if self.descriptor.requires_entity_load() {
            let models =
                fetch_entity_models::<C, E>(self.conn, &builder, bounds, None).await?;
            materialize_models(models, &self.descriptor)?
        } else {
            let mut stmt = builder.build_tuple_select()?;
            if let Some(bounds) = bounds {
                stmt.offset(bounds.offset()).limit(bounds.size);
            }
            let rows = fetch_tuple_rows(self.conn, &stmt, "find_all").await?;
            materialize_rows(rows, &self.descriptor)?
        };

        let Some(bounds) = bounds else {
            return Ok(Page::unpaged(items));
        };

        let total = match deduced_total(bounds, items.len()) {
            Some(total) => total,
            None => {
                let stmt = builder.build_count()?;
                CountQueryBuilder {
                    conn: self.conn,
                    stmt,
                }
                .exec()
                .await?
            }
        };
        Ok(Page::new(items, bounds, total))
    }
}
