//! Projection shapes: which fields a query returns and where each field's
//! value comes from.
//!
//! A shape is either the entity itself (identity) or a custom set of named
//! fields, each backed by a property path. Custom shapes whose fields are all
//! single-valued are built straight from a tuple select; a multi-valued field
//! forces a full entity load instead, because one flat row cannot carry a
//! collection.

use sea_orm::EntityTrait;

use crate::row::ProjectedRow;
use crate::types::{QueryError, RefractError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// The entity itself; materialized from a loaded model.
    Entity,
    /// A declared field list materialized from a tuple row.
    Custom,
}

/// One field of a custom shape.
#[derive(Debug, Clone)]
pub struct ProjectedField {
    /// Accessor name on the shape.
    pub name: String,
    /// Property path the value is read from. Defaults to the field name.
    pub path: String,
    /// Collection-typed fields cannot be carried by a flat row.
    pub multi_valued: bool,
}

/// Statically registered description of a projection shape.
#[derive(Debug, Clone)]
pub struct ProjectionDescriptor {
    shape: String,
    kind: ShapeKind,
    fields: Vec<ProjectedField>,
}

impl ProjectionDescriptor {
    pub fn entity(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            kind: ShapeKind::Entity,
            fields: Vec::new(),
        }
    }

    pub fn builder(shape: impl Into<String>) -> ProjectionBuilder {
        ProjectionBuilder {
            shape: shape.into(),
            fields: Vec::new(),
        }
    }

    pub fn shape_name(&self) -> &str {
        &self.shape
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn fields(&self) -> &[ProjectedField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ProjectedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The declared accessor names, in declaration order.
    pub fn input_properties(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn has_multi_valued_field(&self) -> bool {
        self.fields.iter().any(|f| f.multi_valued)
    }

    /// A custom shape with only single-valued fields is constructed from a
    /// tuple select.
    pub fn needs_custom_construction(&self) -> bool {
        self.kind == ShapeKind::Custom && !self.has_multi_valued_field()
    }

    /// Identity shapes and collection-bearing shapes load the whole entity.
    pub fn requires_entity_load(&self) -> bool {
        !self.needs_custom_construction()
    }

    pub(crate) fn ensure_buildable(&self) -> Result<(), RefractError> {
        if self.kind == ShapeKind::Custom && self.fields.is_empty() {
            return Err(RefractError::InvalidProjection {
                shape: self.shape.clone(),
                message: "custom shape declares no fields".into(),
            });
        }
        Ok(())
    }
}

pub struct ProjectionBuilder {
    shape: String,
    fields: Vec<ProjectedField>,
}

impl ProjectionBuilder {
    /// A single-valued field read from the path of the same name.
    pub fn field(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = name.clone();
        self.push(name, path, false)
    }

    /// A single-valued field read from an explicit property path.
    pub fn field_at(self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.push(name.into(), path.into(), false)
    }

    /// A collection-typed field; its presence routes the shape through an
    /// entity load.
    pub fn collection(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = name.clone();
        self.push(name, path, true)
    }

    fn push(mut self, name: String, path: String, multi_valued: bool) -> Self {
        self.fields.push(ProjectedField {
            name,
            path,
            multi_valued,
        });
        self
    }

    pub fn build(self) -> ProjectionDescriptor {
        ProjectionDescriptor {
            shape: self.shape,
            kind: ShapeKind::Custom,
            fields: self.fields,
        }
    }
}

/// Something a query result can be materialized into.
pub trait ProjectionTarget<E: EntityTrait>: Sized + Send + 'static {
    /// Build from one row of a tuple select.
    fn from_projected_row(row: ProjectedRow) -> Result<Self, QueryError>;

    /// Build from a fully loaded entity model.
    fn from_entity(model: E::Model, descriptor: &ProjectionDescriptor) -> Result<Self, QueryError>;
}

/// A projection target with a statically known descriptor.
pub trait ProjectionShape<E: EntityTrait>: ProjectionTarget<E> {
    fn descriptor() -> ProjectionDescriptor;
}

/// Implements the identity shape for an entity's model type: queries return
/// the model itself, loaded through the plain entity path.
#[macro_export]
macro_rules! entity_projection {
    ($entity:ty) => {
        impl $crate::projection::ProjectionTarget<$entity>
            for <$entity as $crate::sea_orm::EntityTrait>::Model
        {
            fn from_projected_row(
                row: $crate::row::ProjectedRow,
            ) -> Result<Self, $crate::types::QueryError> {
                Err($crate::types::RefractError::InvalidProjection {
                    shape: row.descriptor().shape_name().to_string(),
                    message: "identity shapes are materialized from loaded entities, not tuple rows"
                        .into(),
                }
                .into())
            }

            fn from_entity(
                model: <$entity as $crate::sea_orm::EntityTrait>::Model,
                _descriptor: &$crate::projection::ProjectionDescriptor,
            ) -> Result<Self, $crate::types::QueryError> {
                Ok(model)
            }
        }

        impl $crate::projection::ProjectionShape<$entity>
            for <$entity as $crate::sea_orm::EntityTrait>::Model
        {
            fn descriptor() -> $crate::projection::ProjectionDescriptor {
                $crate::projection::ProjectionDescriptor::entity(stringify!($entity))
            }
        }
    };
}
