//! The repository facade: predicate-based finder operations returning shaped
//! results.

use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::sea_query::Value;
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::metamodel::{EntityMetamodel, MetamodelProvider};
use crate::page::{PageRequest, Sort};
use crate::predicate::Predicate;
use crate::projection::{ProjectionDescriptor, ProjectionShape};
use crate::query_builders::{FirstQueryBuilder, ManyQueryBuilder, UniqueQueryBuilder};
use crate::row::DynamicProjection;
use crate::types::{EntityGraph, ExecutionMetadata, QueryError, RefractError};

/// Finder operations for one entity over one connection. The shape of the
/// result is chosen per call, either statically via a [`ProjectionShape`]
/// type parameter or at runtime via a [`ProjectionDescriptor`].
pub struct ProjectionRepository<'a, C, E>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    conn: &'a C,
    provider: &'a (dyn MetamodelProvider + Sync),
    metamodel: &'static EntityMetamodel,
    metadata: ExecutionMetadata,
    _phantom: PhantomData<E>,
}

impl<'a, C, E> ProjectionRepository<'a, C, E>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    pub fn new(
        conn: &'a C,
        provider: &'a (dyn MetamodelProvider + Sync),
        entity_name: &str,
    ) -> Result<Self, QueryError> {
        let metamodel = provider.metamodel(entity_name).ok_or_else(|| {
            RefractError::UnknownEntity {
                entity: entity_name.to_string(),
            }
        })?;
        Ok(Self {
            conn,
            provider,
            metamodel,
            metadata: ExecutionMetadata::default(),
            _phantom: PhantomData,
        })
    }

    /// Replace the execution metadata applied to every query this repository
    /// builds.
    pub fn with_metadata(mut self, metadata: ExecutionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metamodel(&self) -> &'static EntityMetamodel {
        self.metamodel
    }

    /// Look up one entity by primary key, shaped as `P`.
    pub fn find_by_id<P>(&self, id: impl Into<Value>) -> UniqueQueryBuilder<'a, C, E, P>
    where
        P: ProjectionShape<E>,
    {
        UniqueQueryBuilder {
            conn: self.conn,
            provider: self.provider,
            metamodel: self.metamodel,
            descriptor: Arc::new(P::descriptor()),
            id: id.into(),
            metadata: self.metadata.clone(),
            _phantom: PhantomData,
        }
    }

    /// Find at most one entity matching the predicate; more than one match
    /// is an error.
    pub fn find_one<P>(&self, predicate: Predicate) -> FirstQueryBuilder<'a, C, E, P>
    where
        P: ProjectionShape<E>,
    {
        FirstQueryBuilder {
            conn: self.conn,
            provider: self.provider,
            metamodel: self.metamodel,
            descriptor: Arc::new(P::descriptor()),
            predicate: Some(predicate),
            sort: Sort::unsorted(),
            metadata: self.metadata.clone(),
            _phantom: PhantomData,
        }
    }

    /// Page through all entities matching the predicate.
    pub fn find_all<P>(&self, predicate: Option<Predicate>) -> ManyQueryBuilder<'a, C, E, P>
    where
        P: ProjectionShape<E>,
    {
        ManyQueryBuilder {
            conn: self.conn,
            provider: self.provider,
            metamodel: self.metamodel,
            descriptor: Arc::new(P::descriptor()),
            predicate,
            request: PageRequest::unpaged(),
            metadata: self.metadata.clone(),
            _phantom: PhantomData,
        }
    }

    /// Like [`find_all`](Self::find_all), accepting a named fetch-graph
    /// hint. The hint does not change which rows come back or their shape;
    /// eager-fetch joins are driven by the execution metadata instead.
    pub fn find_all_with_graph<P>(
        &self,
        predicate: Option<Predicate>,
        _graph: &EntityGraph,
    ) -> ManyQueryBuilder<'a, C, E, P>
    where
        P: ProjectionShape<E>,
    {
        self.find_all(predicate)
    }

    /// [`find_one`](Self::find_one) against a runtime-built shape.
    pub fn find_one_dynamic(
        &self,
        descriptor: ProjectionDescriptor,
        predicate: Predicate,
    ) -> FirstQueryBuilder<'a, C, E, DynamicProjection> {
        FirstQueryBuilder {
            conn: self.conn,
            provider: self.provider,
            metamodel: self.metamodel,
            descriptor: Arc::new(descriptor),
            predicate: Some(predicate),
            sort: Sort::unsorted(),
            metadata: self.metadata.clone(),
            _phantom: PhantomData,
        }
    }

    /// [`find_all`](Self::find_all) against a runtime-built shape.
    pub fn find_all_dynamic(
        &self,
        descriptor: ProjectionDescriptor,
        predicate: Option<Predicate>,
    ) -> ManyQueryBuilder<'a, C, E, DynamicProjection> {
        ManyQueryBuilder {
            conn: self.conn,
            provider: self.provider,
            metamodel: self.metamodel,
            descriptor: Arc::new(descriptor),
            predicate,
            request: PageRequest::unpaged(),
            metadata: self.metadata.clone(),
            _phantom: PhantomData,
        }
    }
}
