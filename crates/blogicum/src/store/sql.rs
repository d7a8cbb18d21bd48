//! Listing SQL built with SeaQuery.
//!
//! Renders a [`PostQuery`] into a row query returning [`PostSummary`]
//! columns and a matching COUNT query. Values are inlined by
//! `PostgresQueryBuilder`, so both statements run without bind parameters.
//!
//! [`PostSummary`]: crate::models::PostSummary

use sea_query::{
    Alias, Asterisk, Expr, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
};

use crate::policy::{PostQuery, VisibilityFilter};

const POST: &str = "post";
const USERS: &str = "users";
const CATEGORY: &str = "category";
const LOCATION: &str = "location";
const COMMENT: &str = "comment";

fn col(table: &str, column: &str) -> (Alias, Alias) {
    (Alias::new(table), Alias::new(column))
}

/// Builds listing statements for one [`PostQuery`].
pub struct PostQueryBuilder<'a> {
    query: &'a PostQuery,
}

impl<'a> PostQueryBuilder<'a> {
    pub fn new(query: &'a PostQuery) -> Self {
        Self { query }
    }

    /// Row query: post columns, joined names, comment count, one page.
    pub fn build(&self, offset: u64, limit: u64) -> String {
        let mut select = Query::select();

        select
            .columns([
                col(POST, "id"),
                col(POST, "title"),
                col(POST, "text"),
                col(POST, "image"),
                col(POST, "pub_date"),
                col(POST, "is_published"),
                col(POST, "created_at"),
                col(POST, "author_id"),
                col(POST, "category_id"),
                col(POST, "location_id"),
            ])
            .expr_as(Expr::col(col(USERS, "username")), Alias::new("author_username"))
            .expr_as(Expr::col(col(CATEGORY, "title")), Alias::new("category_title"))
            .expr_as(Expr::col(col(CATEGORY, "slug")), Alias::new("category_slug"))
            .expr_as(
                Expr::col(col(CATEGORY, "is_published")),
                Alias::new("category_is_published"),
            )
            .expr_as(Expr::col(col(LOCATION, "name")), Alias::new("location_name"))
            .expr_as(
                Expr::col(col(LOCATION, "is_published")),
                Alias::new("location_is_published"),
            )
            .expr_as(
                Expr::col(col(COMMENT, "id")).count(),
                Alias::new("comment_count"),
            )
            .from(Alias::new(POST));

        self.add_joins(&mut select);
        select.join(
            JoinType::LeftJoin,
            Alias::new(LOCATION),
            Expr::col(col(LOCATION, "id")).equals(col(POST, "location_id")),
        );
        select.join(
            JoinType::LeftJoin,
            Alias::new(COMMENT),
            Expr::col(col(COMMENT, "post_id")).equals(col(POST, "id")),
        );

        self.add_filters(&mut select);

        select
            .group_by_columns([
                col(POST, "id"),
                col(USERS, "id"),
                col(CATEGORY, "id"),
                col(LOCATION, "id"),
            ])
            .order_by(col(POST, "pub_date"), Order::Desc)
            .order_by(col(POST, "id"), Order::Desc)
            .limit(limit)
            .offset(offset);

        select.to_string(PostgresQueryBuilder)
    }

    /// COUNT query over the same filters. No comment join, no paging.
    pub fn build_count(&self) -> String {
        let mut select = Query::select();

        select
            .expr(Expr::col(Asterisk).count())
            .from(Alias::new(POST));

        self.add_joins(&mut select);
        self.add_filters(&mut select);

        select.to_string(PostgresQueryBuilder)
    }

    /// Author and category joins, needed by both statements.
    fn add_joins(&self, select: &mut SelectStatement) {
        select.join(
            JoinType::InnerJoin,
            Alias::new(USERS),
            Expr::col(col(USERS, "id")).equals(col(POST, "author_id")),
        );
        select.join(
            JoinType::LeftJoin,
            Alias::new(CATEGORY),
            Expr::col(col(CATEGORY, "id")).equals(col(POST, "category_id")),
        );
    }

    fn add_filters(&self, select: &mut SelectStatement) {
        if let VisibilityFilter::Public { now } = self.query.visibility {
            select
                .and_where(Expr::col(col(POST, "is_published")).eq(true))
                .and_where(Expr::col(col(CATEGORY, "is_published")).eq(true))
                .and_where(Expr::col(col(POST, "pub_date")).lte(now));
        }
        if let Some(category_id) = self.query.category_id {
            select.and_where(Expr::col(col(POST, "category_id")).eq(category_id));
        }
        if let Some(author_id) = self.query.author_id {
            select.and_where(Expr::col(col(POST, "author_id")).eq(author_id));
        }
        if let Some(post_id) = self.query.post_id {
            select.and_where(Expr::col(col(POST, "id")).eq(post_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn index_query_filters_and_orders() {
        let query = PostQuery::index(Utc::now());
        let sql = PostQueryBuilder::new(&query).build(20, 10);

        assert!(sql.contains("FROM \"post\""), "{sql}");
        assert!(sql.contains("\"post\".\"is_published\" = TRUE"), "{sql}");
        assert!(sql.contains("\"category\".\"is_published\" = TRUE"), "{sql}");
        assert!(sql.contains("\"post\".\"pub_date\" <="), "{sql}");
        assert!(
            sql.contains("ORDER BY \"post\".\"pub_date\" DESC, \"post\".\"id\" DESC"),
            "{sql}"
        );
        assert!(sql.contains("LIMIT 10"), "{sql}");
        assert!(sql.contains("OFFSET 20"), "{sql}");
    }

    #[test]
    fn listing_counts_comments() {
        let query = PostQuery::index(Utc::now());
        let sql = PostQueryBuilder::new(&query).build(0, 10);

        assert!(sql.contains("COUNT(\"comment\".\"id\") AS \"comment_count\""), "{sql}");
        assert!(sql.contains("LEFT JOIN \"comment\""), "{sql}");
        assert!(sql.contains("GROUP BY"), "{sql}");
    }

    #[test]
    fn unrestricted_query_has_no_publication_filter() {
        let author = Uuid::now_v7();
        let query = PostQuery {
            visibility: VisibilityFilter::Unrestricted,
            category_id: None,
            author_id: Some(author),
            post_id: None,
        };
        let sql = PostQueryBuilder::new(&query).build(0, 10);

        assert!(!sql.contains("is_published\" = TRUE"), "{sql}");
        assert!(!sql.contains("pub_date\" <="), "{sql}");
        assert!(sql.contains(&author.to_string()), "{sql}");
    }

    #[test]
    fn count_query_skips_comments_and_paging() {
        let query = PostQuery::visible_post(Uuid::now_v7(), Utc::now());
        let sql = PostQueryBuilder::new(&query).build_count();

        assert!(sql.contains("COUNT(*)"), "{sql}");
        assert!(sql.contains("\"post\".\"id\" ="), "{sql}");
        assert!(!sql.contains("\"comment\""), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
    }
}
