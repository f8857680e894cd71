use refract::{
    entity_projection, AttributeKind, AttributeModel, EntityGraph, EntityMetamodel,
    ExecutionMetadata, MetamodelRegistry, PageRequest, Predicate, ProjectedRow,
    ProjectionDescriptor, ProjectionRepository, ProjectionShape, ProjectionTarget, QueryError,
    RefractError, RelationModel, Sort, SortOrder,
};

pub mod address {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "addresses")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub city: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod user {
    use chrono::{DateTime, FixedOffset};
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub age: i32,
        pub created_at: DateTime<FixedOffset>,
        #[sea_orm(nullable)]
        pub address_id: Option<i32>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

entity_projection!(user::Entity);

static ADDRESS_META: EntityMetamodel = EntityMetamodel {
    name: "Address",
    table_name: "addresses",
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
            name: "city",
            column_name: "city",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
    ],
};

static USER_META: EntityMetamodel = EntityMetamodel {
    name: "User",
    table_name: "users",
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
            name: "age",
            column_name: "age",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "created_at",
            column_name: "created_at",
            kind: AttributeKind::Scalar,
            optional: false,
            relation: None,
        },
        AttributeModel {
            name: "address",
            column_name: "address_id",
            kind: AttributeKind::ManyToOne,
            optional: true,
            relation: Some(RelationModel {
                target_entity: "Address",
                target_table: "addresses",
                owner_key: "address_id",
                target_key: "id",
            }),
        },
    ],
};

fn registry() -> MetamodelRegistry {
    let mut registry = MetamodelRegistry::new();
    registry.register(&USER_META);
    registry.register(&ADDRESS_META);
    registry
}

/// Name plus the city of the user's address, built from a tuple select.
#[derive(Debug, PartialEq)]
struct UserSummary {
    name: String,
    city: Option<String>,
}

impl ProjectionTarget<user::Entity> for UserSummary {
    fn from_projected_row(row: ProjectedRow) -> Result<Self, QueryError> {
        Ok(Self {
            name: row.get("name")?,
            city: row.get("city")?,
        })
    }

    fn from_entity(
        _model: user::Model,
        descriptor: &ProjectionDescriptor,
    ) -> Result<Self, QueryError> {
        Err(RefractError::InvalidProjection {
            shape: descriptor.shape_name().to_string(),
            message: "built from tuple rows only".into(),
        }
        .into())
    }
}

impl ProjectionShape<user::Entity> for UserSummary {
    fn descriptor() -> ProjectionDescriptor {
        ProjectionDescriptor::builder("UserSummary")
            .field("name")
            .field_at("city", "address.city")
            .build()
    }
}

/// A shape with a collection field; its queries load full entities.
#[derive(Debug)]
struct UserWithAliases {
    name: String,
    aliases: Vec<String>,
}

impl ProjectionTarget<user::Entity> for UserWithAliases {
    fn from_projected_row(row: ProjectedRow) -> Result<Self, QueryError> {
        Err(RefractError::InvalidProjection {
            shape: row.descriptor().shape_name().to_string(),
            message: "collection shapes load entities".into(),
        }
        .into())
    }

    fn from_entity(
        model: user::Model,
        _descriptor: &ProjectionDescriptor,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            name: model.name,
            aliases: Vec::new(),
        })
    }
}

impl ProjectionShape<user::Entity> for UserWithAliases {
    fn descriptor() -> ProjectionDescriptor {
        ProjectionDescriptor::builder("UserWithAliases")
            .field("name")
            .collection("aliases")
            .build()
    }
}

mod helpers {
    use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, EntityTrait, Schema};

    use super::{address, user};

    pub async fn setup_test_db() -> DatabaseConnection {
        use sea_orm::ConnectionTrait;

        let db = Database::connect("sqlite::memory:?mode=rwc").await.unwrap();
        let schema = Schema::new(db.get_database_backend());

        let mut address_table = schema.create_table_from_entity(address::Entity);
        let create_addresses = address_table.if_not_exists();
        db.execute(db.get_database_backend().build(create_addresses))
            .await
            .unwrap();

        let mut user_table = schema.create_table_from_entity(user::Entity);
        let create_users = user_table.if_not_exists();
        db.execute(db.get_database_backend().build(create_users))
            .await
            .unwrap();

        db
    }

    /// Two addresses and 25 users; odd user ids live in Oslo, even ids in
    /// Bergen, and ids divisible by 5 have no address at all.
    pub async fn seed(db: &DatabaseConnection) {
        address::Entity::insert_many(vec![
            address::ActiveModel {
                id: Set(1),
                city: Set("Oslo".to_string()),
            },
            address::ActiveModel {
                id: Set(2),
                city: Set("Bergen".to_string()),
            },
        ])
        .exec(db)
        .await
        .unwrap();

        let base = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        let users: Vec<user::ActiveModel> = (1..=25)
            .map(|i| user::ActiveModel {
                id: Set(i),
                name: Set(format!("user{i:02}")),
                age: Set(20 + (i % 10)),
                created_at: Set(base + chrono::Duration::days(i as i64)),
                address_id: Set(if i % 5 == 0 {
                    None
                } else if i % 2 == 1 {
                    Some(1)
                } else {
                    Some(2)
                }),
            })
            .collect();
        user::Entity::insert_many(users).exec(db).await.unwrap();
    }
}

mod repository_tests {
    use super::helpers::{seed, setup_test_db};
    use super::*;

    #[tokio::test]
    async fn find_by_id_with_identity_shape_returns_the_model() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let found = repo
            .find_by_id::<user::Model>(3)
            .exec()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 3);
        assert_eq!(found.name, "user03");

        let missing = repo.find_by_id::<user::Model>(999).exec().await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn find_by_id_with_custom_shape_projects_across_a_join() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let summary = repo
            .find_by_id::<UserSummary>(1)
            .exec()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.name, "user01");
        assert_eq!(summary.city.as_deref(), Some("Oslo"));

        // the left outer join keeps address-less users
        let detached = repo
            .find_by_id::<UserSummary>(5)
            .exec()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detached.name, "user05");
        assert_eq!(detached.city, None);
    }

    #[tokio::test]
    async fn find_one_returns_the_single_match() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let summary = repo
            .find_one::<UserSummary>(Predicate::equals("name", "user02"))
            .exec()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.city.as_deref(), Some("Bergen"));

        let none = repo
            .find_one::<UserSummary>(Predicate::equals("name", "nobody"))
            .exec()
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn find_one_rejects_multiple_matches() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let err = repo
            .find_one::<UserSummary>(Predicate::equals("address.city", "Oslo"))
            .exec()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("more than one row"), "{err}");
    }

    #[tokio::test]
    async fn find_all_pages_and_counts() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        // full first page: the count query resolves the real total
        let page = repo
            .find_all::<UserSummary>(None)
            .page(PageRequest::of(0, 10).sorted_by(Sort::by("name", SortOrder::Asc)))
            .exec()
            .await
            .unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items[0].name, "user01");

        // short last page: the total is deduced from the page itself
        let last = repo
            .find_all::<UserSummary>(None)
            .page(PageRequest::of(2, 10).sorted_by(Sort::by("name", SortOrder::Asc)))
            .exec()
            .await
            .unwrap();
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.total_elements, 25);
        assert_eq!(last.items[4].name, "user25");
    }

    #[tokio::test]
    async fn find_all_unpaged_returns_everything_without_a_count() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let page = repo.find_all::<UserSummary>(None).exec().await.unwrap();
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.page_number, 0);
    }

    #[tokio::test]
    async fn find_all_filters_through_nested_paths() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        // odd ids not divisible by 5: 1 3 7 9 11 13 17 19 21 23
        let page = repo
            .find_all::<UserSummary>(Some(Predicate::equals("address.city", "Oslo")))
            .exec()
            .await
            .unwrap();
        assert_eq!(page.items.len(), 10);
        assert!(page.items.iter().all(|s| s.city.as_deref() == Some("Oslo")));
    }

    #[tokio::test]
    async fn find_all_filters_on_timestamps() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let cutoff = chrono::DateTime::parse_from_rfc3339("2024-01-21T00:00:00+00:00").unwrap();
        let page = repo
            .find_all::<user::Model>(Some(Predicate::gt("created_at", cutoff)))
            .exec()
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(page.items.iter().all(|m| m.created_at > cutoff));
    }

    #[tokio::test]
    async fn collection_shapes_route_through_an_entity_load() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let page = repo
            .find_all::<UserWithAliases>(Some(Predicate::lte("id", 3)))
            .exec()
            .await
            .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].name, "user01");
        assert!(page.items[0].aliases.is_empty());
    }

    #[tokio::test]
    async fn entity_graph_hint_changes_nothing_observable() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let mut graph = EntityGraph::named("user.withAddress");
        graph.attribute_paths.push("address".to_string());

        let hinted = repo
            .find_all_with_graph::<user::Model>(Some(Predicate::gt("id", 20)), &graph)
            .exec()
            .await
            .unwrap();
        let plain = repo
            .find_all::<user::Model>(Some(Predicate::gt("id", 20)))
            .exec()
            .await
            .unwrap();
        assert_eq!(hinted.items.len(), plain.items.len());
        assert_eq!(hinted.total_elements, plain.total_elements);
    }

    #[tokio::test]
    async fn fetch_path_metadata_keeps_results_stable() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User")
                .unwrap()
                .with_metadata(ExecutionMetadata::default().with_fetch_path("address"));

        let summary = repo
            .find_by_id::<UserSummary>(2)
            .exec()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.city.as_deref(), Some("Bergen"));
    }

    #[tokio::test]
    async fn unknown_entity_and_attribute_are_reported() {
        let db = setup_test_db().await;
        let registry = registry();

        let missing: Result<ProjectionRepository<_, user::Entity>, _> =
            ProjectionRepository::new(&db, &registry, "Ghost");
        assert!(missing.is_err());

        seed(&db).await;
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();
        let err = repo
            .find_one::<UserSummary>(Predicate::equals("nickname", "x"))
            .exec()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nickname"), "{err}");
    }
}

mod dynamic_tests {
    use super::helpers::{seed, setup_test_db};
    use super::*;

    #[tokio::test]
    async fn dynamic_shapes_materialize_from_tuple_rows() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let descriptor = ProjectionDescriptor::builder("NameAndCity")
            .field("name")
            .field_at("city", "address.city")
            .build();
        let found = repo
            .find_one_dynamic(descriptor, Predicate::equals("id", 1))
            .exec()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get::<String>("name").unwrap(), "user01");
        assert_eq!(
            found.get::<Option<String>>("city").unwrap().as_deref(),
            Some("Oslo")
        );
        assert!(found.get::<String>("age").is_err());
    }

    #[tokio::test]
    async fn dynamic_shapes_with_collections_read_entity_attributes() {
        let db = setup_test_db().await;
        seed(&db).await;
        let registry = registry();
        let repo: ProjectionRepository<_, user::Entity> =
            ProjectionRepository::new(&db, &registry, "User").unwrap();

        let descriptor = ProjectionDescriptor::builder("NameWithAliases")
            .field("name")
            .collection("aliases")
            .build();
        let page = repo
            .find_all_dynamic(descriptor, Some(Predicate::equals("id", 4)))
            .exec()
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].get::<String>("name").unwrap(), "user04");
    }
}
