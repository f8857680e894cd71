//! Predicate-based projection queries for SeaORM repositories.
//!
//! Queries are described by three independent inputs: a [`Predicate`] tree
//! over dot-separated property paths, a [`ProjectionDescriptor`] naming the
//! fields the caller wants back, and a [`PageRequest`] with sorting. Paths
//! that cross associations plan deduplicated left outer joins automatically;
//! shapes whose fields are all single-valued execute as narrow tuple selects
//! while identity and collection-bearing shapes load entities.
//!
//! Entities are described by a statically registered [`EntityMetamodel`] and
//! queried through a [`ProjectionRepository`].

pub use sea_orm;

pub mod join;
pub mod metamodel;
pub mod page;
pub mod path;
pub mod predicate;
pub mod projection;
pub mod query_builders;
pub mod repository;
pub mod row;
pub mod types;

pub use join::{requires_join, JoinGraph, JoinParent};
pub use metamodel::{
    AttributeKind, AttributeModel, EntityMetamodel, MetamodelProvider, MetamodelRegistry,
    RelationModel,
};
pub use page::{Page, PageBounds, PageRequest, Sort, SortOrder, SortSpec};
pub use path::{PropertyPath, ResolvedColumn};
pub use predicate::{FieldOp, Predicate};
pub use projection::{
    ProjectedField, ProjectionBuilder, ProjectionDescriptor, ProjectionShape, ProjectionTarget,
    ShapeKind,
};
pub use query_builders::{CountQueryBuilder, FirstQueryBuilder, ManyQueryBuilder, UniqueQueryBuilder};
pub use repository::ProjectionRepository;
pub use row::{DynamicProjection, ProjectedRow};
pub use types::{
    EntityGraph, ExecutionMetadata, LockBehavior, QueryError, RefractError, RefractResult,
};
