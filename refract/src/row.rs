//! Row materialization: turning tuple rows and loaded models into shape
//! values.

use std::sync::Arc;

use sea_orm::sea_query::{Value, ValueType};
use sea_orm::{EntityTrait, Iden, IdenStatic, Iterable, ModelTrait, QueryResult, TryGetable};

use crate::projection::{ProjectionDescriptor, ProjectionTarget};
use crate::types::{QueryError, RefractError};

/// One row of a tuple select together with the shape it was selected for.
/// Columns are aliased by their source property path, so lookup is by path
/// and independent of select-list order.
pub struct ProjectedRow {
    row: QueryResult,
    descriptor: Arc<ProjectionDescriptor>,
}

impl ProjectedRow {
    pub(crate) fn new(row: QueryResult, descriptor: Arc<ProjectionDescriptor>) -> Self {
        Self { row, descriptor }
    }

    pub fn descriptor(&self) -> &ProjectionDescriptor {
        &self.descriptor
    }

    /// Read a field by its accessor name on the shape.
    pub fn get<T: TryGetable>(&self, name: &str) -> Result<T, QueryError> {
        let field = self.descriptor.field(name).ok_or_else(|| {
            RefractError::FieldNotSelected {
                shape: self.descriptor.shape_name().to_string(),
                field: name.to_string(),
            }
        })?;
        self.row.try_get("", &field.path)
    }

    /// Read a column straight by its select alias.
    pub fn get_by_alias<T: TryGetable>(&self, alias: &str) -> Result<T, QueryError> {
        self.row.try_get("", alias)
    }
}

enum DynamicSource {
    Row(ProjectedRow),
    Entity {
        shape: String,
        values: Vec<(String, Value)>,
    },
}

/// A projection materialized against a runtime-built descriptor, for callers
/// that do not have a compile-time shape type. Fields are read by name.
pub struct DynamicProjection {
    source: DynamicSource,
}

impl DynamicProjection {
    pub fn get<T: TryGetable + ValueType>(&self, name: &str) -> Result<T, QueryError> {
        match &self.source {
            DynamicSource::Row(row) => row.get(name),
            DynamicSource::Entity { shape, values } => {
                let (_, value) = values
                    .iter()
                    .find(|(field, _)| field == name)
                    .ok_or_else(|| RefractError::FieldNotSelected {
                        shape: shape.clone(),
                        field: name.to_string(),
                    })?;
                T::try_from(value.clone())
                    .map_err(|_| sea_orm::DbErr::Type(format!(
                        "field '{name}' of shape '{shape}' holds an incompatible value"
                    )))
            }
        }
    }
}

impl<E: EntityTrait> ProjectionTarget<E> for DynamicProjection {
    fn from_projected_row(row: ProjectedRow) -> Result<Self, QueryError> {
        Ok(Self {
            source: DynamicSource::Row(row),
        })
    }

    fn from_entity(model: E::Model, descriptor: &ProjectionDescriptor) -> Result<Self, QueryError> {
        let mut values = Vec::with_capacity(descriptor.fields().len());
        for field in descriptor.fields() {
            // Collection fields stay out of the flat value list; the caller
            // asked for them to route the query through an entity load.
            if field.multi_valued {
                continue;
            }
            if field.path.contains('.') {
                return Err(RefractError::UnsupportedTraversal {
                    path: field.path.clone(),
                    reason: "entity-loaded shapes can only read the entity's own attributes".into(),
                }
                .into());
            }
            let column = E::Column::iter()
                .find(|c| IdenStatic::as_str(c) == field.path || c.to_string() == field.path)
                .ok_or_else(|| RefractError::UnknownAttribute {
                    entity: std::any::type_name::<E>().to_string(),
                    attribute: field.path.clone(),
                })?;
            values.push((field.name.clone(), model.get(column)));
        }
        Ok(Self {
            source: DynamicSource::Entity {
                shape: descriptor.shape_name().to_string(),
                values,
            },
        })
    }
}

/// Materialize tuple rows into shape values.
pub(crate) fn materialize_rows<E, P>(
    rows: Vec<QueryResult>,
    descriptor: &Arc<ProjectionDescriptor>,
) -> Result<Vec<P>, QueryError>
where
    E: EntityTrait,
    P: ProjectionTarget<E>,
{
    rows.into_iter()
        .map(|row| P::from_projected_row(ProjectedRow::new(row, descriptor.clone())))
        .collect()
}

/// Materialize loaded models into shape values.
pub(crate) fn materialize_models<E, P>(
    models: Vec<E::Model>,
    descriptor: &ProjectionDescriptor,
) -> Result<Vec<P>, QueryError>
where
    E: EntityTrait,
    P: ProjectionTarget<E>,
{
    models
        .into_iter()
        .map(|model| P::from_entity(model, descriptor))
        .collect()
}
