//! Shared execution helpers for the query builders.

use sea_orm::sea_query::SelectStatement;
use sea_orm::{ConnectionTrait, EntityTrait, QueryResult, QuerySelect, QueryTrait};

use crate::page::PageBounds;
use crate::query_builders::tuple::StatementBuilder;
use crate::types::QueryError;

/// Run the plain entity finder decorated with the builder's predicate, sort,
/// fetch joins and lock.
pub(crate) async fn fetch_entity_models<C, E>(
    conn: &C,
    builder: &StatementBuilder<'_>,
    bounds: Option<PageBounds>,
    limit: Option<u64>,
) -> Result<Vec<E::Model>, QueryError>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut select = E::find();
    builder.apply_to_entity_query(QueryTrait::query(&mut select))?;
    if let Some(bounds) = bounds {
        select = select.offset(bounds.offset()).limit(bounds.size);
    }
    if let Some(limit) = limit {
        select = select.limit(limit);
    }
    select.all(conn).await
}

/// Execute a raw select and return its rows.
pub(crate) async fn fetch_tuple_rows<C>(
    conn: &C,
    stmt: &SelectStatement,
    op: &str,
) -> Result<Vec<QueryResult>, QueryError>
where
    C: ConnectionTrait,
{
    let backend = conn.get_database_backend();
    let statement = backend.build(stmt);
    tracing::debug!(target: "refract::query", %op, sql = %statement.sql, "executing");
    conn.query_all(statement).await
}
