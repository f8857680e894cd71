use refract::{AttributeKind, AttributeModel, EntityMetamodel, MetamodelRegistry, RelationModel};

pub mod author {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "authors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub email: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod post {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub published: bool,
        #[sea_orm(nullable)]
        pub author_id: Option<i32>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

refract::entity_projection!(post::Entity);
refract::entity_projection!(author::Entity);

pub static AUTHOR_META: EntityMetamodel = EntityMetamodel {
    name: "Author",
    table_name: "authors",
    primary_key: "id",
    attributes: &[
        AttributeModel {
            name: "id",
            column_name: "id",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "name",
            column_name: "name",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "email",
            column_name: "email",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "posts",
            column_name: "id",
            kind: AttributeKind::OneToMany,
            optional: true,
            relation: Some(RelationModel {
                target_entity: "Post",
                target_table: "posts",
                owner_key: "id",
                target_key: "author_id",
            }),
        },
    ],
};

pub static POST_META: EntityMetamodel = EntityMetamodel {
    name: "Post",
    table_name: "posts",
    primary_key: "id",
    attributes: &[
        AttributeModel {
            name: "id",
            column_name: "id",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "title",
            column_name: "title",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "published",
            column_name: "published",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "author",
            column_name: "author_id",
            kind: AttributeKind::ManyToOne,
            optional: true,
            relation: Some(RelationModel {
                target_entity: "Author",
                target_table: "authors",
                owner_key: "author_id",
                target_key: "id",
            }),
        },
    ],
};

pub fn registry() -> MetamodelRegistry {
    let mut registry = MetamodelRegistry::new();
    registry.register(&POST_META);
    registry.register(&AUTHOR_META);
    registry
}
