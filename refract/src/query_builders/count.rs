//! Count query execution.

use sea_orm::sea_query::SelectStatement;
use sea_orm::ConnectionTrait;

use crate::query_builders::utils::fetch_tuple_rows;
use crate::types::QueryError;

/// Executes a prepared count statement. Grouped backends can return several
/// count rows; they are summed, with missing values counting as zero.
pub struct CountQueryBuilder<'a, C>
where
    C: ConnectionTrait,
{
    pub(crate) conn: &'a C,
    pub(crate) stmt: SelectStatement,
}

impl<'a, C> CountQueryBuilder<'a, C>
where
    C: ConnectionTrait,
{
    pub async fn exec(self) -> Result<u64, QueryError> {
        let rows = fetch_tuple_rows(self.conn, &self.stmt, "count").await?;
        let counts = rows
            .iter()
            .map(|row| row.try_get::<Option<i64>>("", "count").unwrap_or(None));
        Ok(sum_counts(counts))
    }
}

pub(crate) fn sum_counts<I>(counts: I) -> u64
where
    I: IntoIterator<Item = Option<i64>>,
{
    counts
        .into_iter()
        .map(|count| count.unwrap_or(0).max(0) as u64)
        .sum()
}
