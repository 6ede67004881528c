/// Listing service - search, filter, order and paginate articles
use crate::db::{article_repo, tag_repo};
use crate::error::Result;
use crate::models::{Article, ArticleFilter, ArticleOrder};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Raw query parameters of the listing route. Every field is optional and
/// malformed values fall back to "no filter" rather than failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub search: Option<String>,
    pub order: Option<String>,
    pub column: Option<String>,
    pub tag: Option<String>,
    pub page: Option<String>,
}

impl ListingParams {
    /// Translate raw parameters into store filters
    pub fn filter(&self) -> ArticleFilter {
        let search = self
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let column_id = self
            .column
            .as_deref()
            .filter(|c| !c.is_empty() && c.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|c| c.parse::<i64>().ok())
            .filter(|id| *id > 0);

        let tag = self
            .tag
            .as_deref()
            .filter(|t| !t.is_empty() && *t != "None")
            .map(str::to_string);

        ArticleFilter {
            search,
            column_id,
            tag,
        }
    }

    pub fn order(&self) -> ArticleOrder {
        ArticleOrder::from_param(self.order.as_deref())
    }
}

/// Page arithmetic with forgiving page lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub count: i64,
    pub per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty result still has one page
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Resolve a raw page parameter. Missing or non-numeric input is page 1,
    /// anything out of range is the last page.
    pub fn get_page(&self, raw: Option<&str>) -> i64 {
        let last = self.num_pages();
        match raw.map(str::trim).and_then(|p| p.parse::<i64>().ok()) {
            None => 1,
            Some(n) if n < 1 || n > last => last,
            Some(n) => n,
        }
    }

    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn page_info(&self, number: i64) -> PageInfo {
        let num_pages = self.num_pages();
        let has_previous = number > 1;
        let has_next = number < num_pages;
        PageInfo {
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
            has_previous,
            has_next,
            previous_page_number: has_previous.then(|| number - 1),
            next_page_number: has_next.then(|| number + 1),
        }
    }
}

/// Pagination context returned with a page of articles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<i64>,
    pub next_page_number: Option<i64>,
}

/// One page of the listing plus the echoed filter values
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub page: PageInfo,
    pub search: String,
    pub order: String,
    pub column: String,
    pub tag: String,
}

pub struct ListingService {
    pool: SqlitePool,
    page_size: i64,
}

impl ListingService {
    pub fn new(pool: SqlitePool, page_size: i64) -> Self {
        Self { pool, page_size }
    }

    /// List articles for the given query parameters. Never fails on input.
    pub async fn list(&self, params: &ListingParams) -> Result<ArticlePage> {
        let filter = params.filter();
        let order = params.order();

        let count = article_repo::count_articles(&self.pool, &filter).await?;
        let paginator = Paginator::new(count, self.page_size);
        let number = paginator.get_page(params.page.as_deref());

        let mut articles = article_repo::list_articles(
            &self.pool,
            &filter,
            order,
            paginator.per_page,
            paginator.offset(number),
        )
        .await?;

        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        let mut tags = tag_repo::tags_for_articles(&self.pool, &ids).await?;
        for article in &mut articles {
            article.tags = tags.remove(&article.id).unwrap_or_default();
        }

        tracing::debug!(
            count,
            page = number,
            search = ?filter.search,
            column = ?filter.column_id,
            tag = ?filter.tag,
            "Listed articles"
        );

        Ok(ArticlePage {
            articles,
            page: paginator.page_info(number),
            search: params.search.clone().unwrap_or_default(),
            order: params.order.clone().unwrap_or_default(),
            column: params.column.clone().unwrap_or_default(),
            tag: params.tag.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(column: Option<&str>, tag: Option<&str>) -> ListingParams {
        ListingParams {
            column: column.map(str::to_string),
            tag: tag.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_column_filter_requires_positive_digits() {
        assert_eq!(params(Some("3"), None).filter().column_id, Some(3));
        assert_eq!(params(Some("0"), None).filter().column_id, None);
        assert_eq!(params(Some("-1"), None).filter().column_id, None);
        assert_eq!(params(Some("abc"), None).filter().column_id, None);
        assert_eq!(params(Some(""), None).filter().column_id, None);
        assert_eq!(params(Some("None"), None).filter().column_id, None);
    }

    #[test]
    fn test_tag_filter_ignores_absence_marker() {
        assert_eq!(params(None, Some("rust")).filter().tag.as_deref(), Some("rust"));
        assert_eq!(params(None, Some("None")).filter().tag, None);
        assert_eq!(params(None, Some("")).filter().tag, None);
    }

    #[test]
    fn test_num_pages() {
        assert_eq!(Paginator::new(0, 3).num_pages(), 1);
        assert_eq!(Paginator::new(3, 3).num_pages(), 1);
        assert_eq!(Paginator::new(4, 3).num_pages(), 2);
        assert_eq!(Paginator::new(7, 3).num_pages(), 3);
    }

    #[test]
    fn test_get_page_is_forgiving() {
        let paginator = Paginator::new(7, 3);
        assert_eq!(paginator.get_page(None), 1);
        assert_eq!(paginator.get_page(Some("abc")), 1);
        assert_eq!(paginator.get_page(Some("2")), 2);
        assert_eq!(paginator.get_page(Some("99")), 3);
        assert_eq!(paginator.get_page(Some("0")), 3);
        assert_eq!(paginator.get_page(Some("-4")), 3);
    }

    #[test]
    fn test_page_info_navigation() {
        let paginator = Paginator::new(7, 3);

        let first = paginator.page_info(1);
        assert!(!first.has_previous);
        assert_eq!(first.next_page_number, Some(2));

        let last = paginator.page_info(3);
        assert!(last.has_previous);
        assert!(!last.has_next);
        assert_eq!(last.previous_page_number, Some(2));
        assert_eq!(paginator.offset(3), 6);
    }
}
