//! Query-string driven listing: filtering, sorting, field projection and
//! offset pagination for blogs and comments.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{PortalError, Result};
use crate::models::{normalize_tags, Blog, Comment};

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_SORT: &str = "-createdAt";

/// Fields a listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    LikesCount,
    ViewsCount,
}

impl SortField {
    pub const BLOG_FIELDS: &'static [SortField] = &[
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::Title,
        SortField::LikesCount,
        SortField::ViewsCount,
    ];

    pub const COMMENT_FIELDS: &'static [SortField] = &[
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::LikesCount,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            "likesCount" => Some(Self::LikesCount),
            "viewsCount" => Some(Self::ViewsCount),
            _ => None,
        }
    }

    /// Field name inside stored documents
    pub fn document_key(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Title => "title",
            Self::LikesCount => "likesCount",
            Self::ViewsCount => "viewsCount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Parse a `sort=-createdAt,title` style parameter. Unknown or disallowed
/// fields are skipped; if nothing usable remains the default applies.
pub fn parse_sort(raw: Option<&str>, allowed: &[SortField]) -> Vec<SortKey> {
    let keys = parse_sort_keys(raw.unwrap_or(""), allowed);
    if keys.is_empty() {
        parse_sort_keys(DEFAULT_SORT, allowed)
    } else {
        keys
    }
}

fn parse_sort_keys(raw: &str, allowed: &[SortField]) -> Vec<SortKey> {
    let mut keys: Vec<SortKey> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (descending, name) = match part.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, part),
        };
        let Some(field) = SortField::parse(name) else {
            continue;
        };
        if allowed.contains(&field) && !keys.iter().any(|k| k.field == field) {
            keys.push(SortKey { field, descending });
        }
    }
    keys
}

/// One page of an offset-paginated listing (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let page = parse_positive("page", page)?.unwrap_or(1).max(1);
        let limit = parse_positive("limit", limit)?
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        Ok(Self { page, limit })
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<u32>> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| PortalError::bad_request(format!("Invalid {name} value: {raw}"))),
        None => Ok(None),
    }
}

/// Conditions a blog must satisfy to be listed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilter {
    /// Blog must carry at least one of these tags
    pub tags: Vec<String>,
    /// Case-insensitive substring of title or content
    pub search: Option<String>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Blog author must be one of these ids
    pub authors: Option<Vec<String>>,
}

impl BlogFilter {
    pub fn matches(&self, blog: &Blog) -> bool {
        if !self.tags.is_empty() && !blog.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        if let Some(term) = &self.search {
            if !contains_ignore_case(&blog.title, term) && !contains_ignore_case(&blog.content, term) {
                return false;
            }
        }
        if let Some(term) = &self.title {
            if !contains_ignore_case(&blog.title, term) {
                return false;
            }
        }
        if let Some(authors) = &self.authors {
            if !authors.contains(&blog.author) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Parsed `GET /blogs` query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogListQuery {
    pub filter: BlogFilter,
    pub sort: Vec<SortKey>,
    pub page: Page,
    pub fields: Option<Vec<String>>,
}

impl Default for BlogListQuery {
    fn default() -> Self {
        Self {
            filter: BlogFilter::default(),
            sort: parse_sort(None, SortField::BLOG_FIELDS),
            page: Page::default(),
            fields: None,
        }
    }
}

impl BlogListQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| params.get(key).map(String::as_str);

        let tags = get("tags")
            .map(|raw| normalize_tags(raw.split(',')))
            .unwrap_or_default();
        let search = non_blank(get("search"));
        let authors = non_blank(get("author")).map(|author| vec![author]);

        Ok(Self {
            filter: BlogFilter {
                tags,
                search,
                title: None,
                authors,
            },
            sort: parse_sort(get("sort"), SortField::BLOG_FIELDS),
            page: Page::from_params(get("page"), get("limit"))?,
            fields: get("fields").map(parse_fields),
        })
    }
}

/// Parsed `GET /blogs/search` query string. `author` matches an author's
/// name (substring, ignoring case) or their exact id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogSearchQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub sort: Vec<SortKey>,
    pub page: Page,
}

impl BlogSearchQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| params.get(key).map(String::as_str);

        Ok(Self {
            title: non_blank(get("title")),
            author: non_blank(get("author")),
            sort: parse_sort(get("sort"), SortField::BLOG_FIELDS),
            page: Page::from_params(get("page"), get("limit"))?,
        })
    }
}

pub(crate) fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

fn parse_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep only the requested top-level fields of a serialized document.
/// `id` is always kept.
pub fn project_fields(value: Value, fields: &[String]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                .collect(),
        ),
        other => other,
    }
}

/// A single sortable value extracted from a document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Time(DateTime<Utc>),
    Text(&'a str),
    Count(u64),
}

/// Documents that can be ordered by [`SortKey`]s in memory
pub trait Sortable {
    fn id(&self) -> &str;
    fn sort_value(&self, field: SortField) -> Option<SortValue<'_>>;
}

impl Sortable for Blog {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_value(&self, field: SortField) -> Option<SortValue<'_>> {
        Some(match field {
            SortField::CreatedAt => SortValue::Time(self.created_at),
            SortField::UpdatedAt => SortValue::Time(self.updated_at),
            SortField::Title => SortValue::Text(&self.title),
            SortField::LikesCount => SortValue::Count(self.likes_count),
            SortField::ViewsCount => SortValue::Count(self.views_count),
        })
    }
}

impl Sortable for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_value(&self, field: SortField) -> Option<SortValue<'_>> {
        match field {
            SortField::CreatedAt => Some(SortValue::Time(self.created_at)),
            SortField::UpdatedAt => Some(SortValue::Time(self.updated_at)),
            SortField::LikesCount => Some(SortValue::Count(self.likes_count)),
            SortField::Title | SortField::ViewsCount => None,
        }
    }
}

/// Compare two documents by the sort keys, falling back to id for a stable order
pub fn compare_by<T: Sortable>(a: &T, b: &T, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = a.sort_value(key.field).cmp(&b.sort_value(key.field));
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id().cmp(b.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_query() {
        let query = BlogListQuery::from_params(&HashMap::new()).unwrap();
        assert_eq!(query.page, Page::default());
        assert_eq!(
            query.sort,
            vec![SortKey {
                field: SortField::CreatedAt,
                descending: true
            }]
        );
        assert_eq!(query.filter, BlogFilter::default());
        assert!(query.fields.is_none());
    }

    #[test]
    fn test_full_query() {
        let query = BlogListQuery::from_params(&params(&[
            ("page", "3"),
            ("limit", "10"),
            ("sort", "title,-viewsCount,bogus"),
            ("tags", "Math, calculus"),
            ("search", "  limits "),
            ("fields", "title,tags"),
        ]))
        .unwrap();

        assert_eq!(query.page, Page { page: 3, limit: 10 });
        assert_eq!(query.page.skip(), 20);
        assert_eq!(query.sort.len(), 2);
        assert_eq!(query.sort[0].field, SortField::Title);
        assert!(!query.sort[0].descending);
        assert_eq!(query.sort[1].field, SortField::ViewsCount);
        assert!(query.sort[1].descending);
        assert_eq!(query.filter.tags, vec!["math", "calculus"]);
        assert_eq!(query.filter.search.as_deref(), Some("limits"));
        assert_eq!(query.fields, Some(vec!["title".to_string(), "tags".to_string()]));
    }

    #[test]
    fn test_search_query() {
        let query =
            BlogSearchQuery::from_params(&params(&[("title", " Limits "), ("author", "")])).unwrap();
        assert_eq!(query.title.as_deref(), Some("Limits"));
        assert!(query.author.is_none());
        assert_eq!(query.page, Page::default());
    }

    #[test]
    fn test_invalid_page_is_rejected() {
        let err = BlogListQuery::from_params(&params(&[("page", "two")])).unwrap_err();
        assert!(matches!(err, PortalError::BadRequest(_)));
    }

    #[test]
    fn test_limit_is_clamped() {
        let page = Page::from_params(Some("0"), Some("5000")).unwrap();
        assert_eq!(page, Page { page: 1, limit: MAX_PAGE_LIMIT });
    }

    #[test]
    fn test_comment_sort_skips_blog_only_fields() {
        let keys = parse_sort(Some("title"), SortField::COMMENT_FIELDS);
        assert_eq!(keys[0].field, SortField::CreatedAt);
        assert!(keys[0].descending);
    }

    #[test]
    fn test_project_fields_keeps_id() {
        let projected = project_fields(
            json!({"id": "b1", "title": "t", "content": "c", "tags": []}),
            &["title".to_string()],
        );
        assert_eq!(projected, json!({"id": "b1", "title": "t"}));
    }
}
