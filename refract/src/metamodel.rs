// Entity metamodel structures and registry for path resolution and join planning

use std::collections::HashMap;

use heck::ToPascalCase;

/// Persistence kind of a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Scalar,
    /// Embedded value object flattened into the owning table's columns.
    Embedded,
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
    ElementCollection,
}

impl AttributeKind {
    pub fn is_association(self) -> bool {
        matches!(
            self,
            AttributeKind::OneToOne
                | AttributeKind::ManyToOne
                | AttributeKind::OneToMany
                | AttributeKind::ManyToMany
                | AttributeKind::ElementCollection
        )
    }

    pub fn is_collection(self) -> bool {
        matches!(
            self,
            AttributeKind::OneToMany | AttributeKind::ManyToMany | AttributeKind::ElementCollection
        )
    }
}

/// How an association is joined: the ON clause compares the owner-side key
/// column against the joined table's key column.
#[derive(Debug, Clone)]
pub struct RelationModel {
    pub target_entity: &'static str,
    pub target_table: &'static str,
    /// Column on the owning (parent) side of the join.
    pub owner_key: &'static str,
    /// Column on the joined (target) side.
    pub target_key: &'static str,
}

#[derive(Debug, Clone)]
pub struct AttributeModel {
    pub name: &'static str,
    /// Backing column on the owning table. For to-one associations this is
    /// the foreign key column, which lets a bare predicate reference compare
    /// the association's identity without a join.
    pub column_name: &'static str,
    pub kind: AttributeKind,
    /// Declared optionality of the mapping. Kept as metamodel fact; the join
    /// planner uses a left outer join either way.
    pub optional: bool,
    pub relation: Option<RelationModel>,
}

#[derive(Debug, Clone)]
pub struct EntityMetamodel {
    pub name: &'static str,
    pub table_name: &'static str,
    /// Attribute name of the identifier.
    pub primary_key: &'static str,
    pub attributes: &'static [AttributeModel],
}

impl EntityMetamodel {
    pub fn attribute(&self, name: &str) -> Option<&AttributeModel> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn primary_key_column(&self) -> &str {
        self.attribute(self.primary_key)
            .map(|attr| attr.column_name)
            .unwrap_or(self.primary_key)
    }
}

/// Trait for entity metamodel resolution.
pub trait MetamodelProvider {
    fn metamodel(&self, entity_name: &str) -> Option<&'static EntityMetamodel>;
}

/// Immutable registry of entity metamodels, built once at startup.
#[derive(Default)]
pub struct MetamodelRegistry {
    entities: HashMap<&'static str, &'static EntityMetamodel>,
}

impl MetamodelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metamodel: &'static EntityMetamodel) -> &mut Self {
        self.entities.insert(metamodel.name, metamodel);
        self
    }

    /// Namespace-aware lookup: exact match first, then the last path segment
    /// of a `::`-qualified name, then a PascalCase rendering of the input.
    pub fn get(&self, entity_name: &str) -> Option<&'static EntityMetamodel> {
        if let Some(meta) = self.entities.get(entity_name).copied() {
            return Some(meta);
        }
        if let Some(colon_pos) = entity_name.rfind("::") {
            let unqualified = &entity_name[colon_pos + 2..];
            if let Some(meta) = self.entities.get(unqualified).copied() {
                return Some(meta);
            }
        }
        let pascal = entity_name.to_pascal_case();
        self.entities.get(pascal.as_str()).copied()
    }
}

impl MetamodelProvider for MetamodelRegistry {
    fn metamodel(&self, entity_name: &str) -> Option<&'static EntityMetamodel> {
        self.get(entity_name)
    }
}
