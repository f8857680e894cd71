//! Small end-to-end tour: an in-memory blog schema queried through shaped
//! projections.

mod entities;

use refract::{
    PageRequest, Predicate, ProjectedRow, ProjectionDescriptor, ProjectionRepository,
    ProjectionShape, ProjectionTarget, QueryError, RefractError, Sort, SortOrder,
};
use sea_orm::{ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

use entities::{author, post, registry};

/// Post headline with the author's name pulled across the join.
#[derive(Debug)]
struct PostHeadline {
    title: String,
    author: Option<String>,
}

impl ProjectionTarget<post::Entity> for PostHeadline {
    fn from_projected_row(row: ProjectedRow) -> Result<Self, QueryError> {
        Ok(Self {
            title: row.get("title")?,
            author: row.get("author")?,
        })
    }

    fn from_entity(
        _model: post::Model,
        descriptor: &ProjectionDescriptor,
    ) -> Result<Self, QueryError> {
        Err(RefractError::InvalidProjection {
            shape: descriptor.shape_name().to_string(),
            message: "built from tuple rows only".into(),
        }
        .into())
    }
}

impl ProjectionShape<post::Entity> for PostHeadline {
    fn descriptor() -> ProjectionDescriptor {
        ProjectionDescriptor::builder("PostHeadline")
            .field("title")
            .field_at("author", "author.name")
            .build()
    }
}

async fn setup(db: &DatabaseConnection) -> Result<(), QueryError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(schema.create_table_from_entity(author::Entity).if_not_exists()))
        .await?;
    db.execute(backend.build(schema.create_table_from_entity(post::Entity).if_not_exists()))
        .await?;

    author::Entity::insert_many(vec![
        author::ActiveModel {
            id: Set(1),
            name: Set("Ada".to_string()),
            email: Set("ada@example.com".to_string()),
        },
        author::ActiveModel {
            id: Set(2),
            name: Set("Grace".to_string()),
            email: Set("grace@example.com".to_string()),
        },
    ])
    .exec(db)
    .await?;

    let posts: Vec<post::ActiveModel> = (1..=8)
        .map(|i| post::ActiveModel {
            id: Set(i),
            title: Set(format!("Post #{i}")),
            published: Set(i % 2 == 0),
            author_id: Set(if i % 3 == 0 { None } else { Some(1 + (i % 2)) }),
        })
        .collect();
    post::Entity::insert_many(posts).exec(db).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), QueryError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,refract=debug".into()),
        )
        .init();

    let db = Database::connect("sqlite::memory:?mode=rwc").await?;
    setup(&db).await?;

    let registry = registry();
    let posts: ProjectionRepository<_, post::Entity> =
        ProjectionRepository::new(&db, &registry, "Post")?;

    // identity shape: the entity itself
    if let Some(model) = posts.find_by_id::<post::Model>(1).exec().await? {
        tracing::info!(title = %model.title, "loaded by id");
    }

    // custom shape: narrow tuple select with an automatic left outer join
    let page = posts
        .find_all::<PostHeadline>(Some(Predicate::equals("published", true)))
        .page(PageRequest::of(0, 5).sorted_by(Sort::by("author.name", SortOrder::Asc)))
        .exec()
        .await?;
    tracing::info!(total = page.total_elements, "published posts");
    for headline in &page.items {
        tracing::info!(
            title = %headline.title,
            author = headline.author.as_deref().unwrap_or("<none>"),
            "headline"
        );
    }

    // runtime-built shape
    let descriptor = ProjectionDescriptor::builder("TitleOnly").field("title").build();
    let drafts = posts
        .find_all_dynamic(descriptor, Some(Predicate::equals("published", false)))
        .exec()
        .await?;
    for item in &drafts.items {
        tracing::info!(title = %item.get::<String>("title")?, "draft");
    }

    Ok(())
}
