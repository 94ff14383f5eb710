use serde::{Deserialize, Serialize};

use crate::posts::Post;

/// Indexed field paths the query builders are allowed to target.
pub mod fields {
    pub const ID: &str = "id";
    pub const POSTER_ID: &str = "poster_id";
    pub const TAGS: &str = "tags";
    pub const USER_TAG_ID: &str = "user_tags.id";
    pub const COMMENT_COMMENTER_ID: &str = "comments.commenter.id";
}

/// Field projection for the overview shape returned by every search.
pub const OVERVIEW_FIELDS: &[&str] = &[
    "id",
    "image_url",
    "description",
    "poster",
    "posted_at_ms",
    "tags",
    "user_tags",
    "likes",
    "dislikes",
    "favorites",
    "comments",
];

/// Boolean filter tree sent to the document store. `must` and `filter`
/// clauses are conjunctive; `should` clauses are disjunctive and, when
/// present, at least one has to match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub should: Vec<Query>,
    pub filter: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, clause: Query) -> Self {
        self.must.push(clause);
        self
    }

    pub fn should(mut self, clause: Query) -> Self {
        self.should.push(clause);
        self
    }

    pub fn filter(mut self, clause: Query) -> Self {
        self.filter.push(clause);
        self
    }

    pub fn build(self) -> Query {
        Query::Bool(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Term { field: String, value: String },
    Match { field: String, value: String },
    Bool(BoolQuery),
    MatchNone,
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn match_text(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Reference matching semantics for post documents. The in-memory
    /// store evaluates queries with this; an external engine must agree
    /// with it for the indexed fields above.
    pub fn matches_post(&self, post: &Post) -> bool {
        match self {
            Query::MatchNone => false,
            Query::Term { field, value } | Query::Match { field, value } => {
                field_matches(post, field, value)
            }
            Query::Bool(clauses) => {
                clauses.must.iter().all(|clause| clause.matches_post(post))
                    && clauses
                        .filter
                        .iter()
                        .all(|clause| clause.matches_post(post))
                    && (clauses.should.is_empty()
                        || clauses
                            .should
                            .iter()
                            .any(|clause| clause.matches_post(post)))
            }
        }
    }
}

fn field_matches(post: &Post, field: &str, value: &str) -> bool {
    match field {
        fields::ID => post.id == value,
        fields::POSTER_ID => post.poster_id() == value,
        fields::TAGS => post.tags.contains(value),
        fields::USER_TAG_ID => post.user_tags.iter().any(|snapshot| snapshot.id == value),
        fields::COMMENT_COMMENTER_ID => post
            .comments
            .iter()
            .any(|comment| comment.commenter.id == value),
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    PostedAtAsc,
    PostedAtDesc,
}

/// A filtered search against the post index: filter tree, overview field
/// projection, index-convention sort and pass-through pagination.
#[derive(Clone, Debug)]
pub struct PostSearch {
    pub query: Query,
    pub fields: &'static [&'static str],
    pub sort: SortOrder,
    pub page: Option<PageRequest>,
}

/// Overview-shaped search: requested fields are the overview projection
/// and the sort is `posted_at` ascending, the index convention.
pub fn overview_search(query: Query, page: Option<PageRequest>) -> PostSearch {
    PostSearch {
        query,
        fields: OVERVIEW_FIELDS,
        sort: SortOrder::PostedAtAsc,
        page,
    }
}

/// Exact poster match, AND semantics with any outer query.
pub fn posts_by_poster_query(poster_id: &str) -> Query {
    BoolQuery::new()
        .filter(Query::term(fields::POSTER_ID, poster_id))
        .build()
}

/// Disjunctive tag match: a post qualifies with at least one of the
/// requested tags. An empty tag list matches nothing rather than
/// everything.
pub fn posts_by_tags_query(tags: &[String]) -> Query {
    if tags.is_empty() {
        return Query::MatchNone;
    }
    let mut query = BoolQuery::new();
    for tag in tags {
        query = query.should(Query::match_text(fields::TAGS, tag));
    }
    query.build()
}

/// OR-combined exact poster matches over a viewer's visibility set, meant
/// to be ANDed with a tag or poster filter.
pub fn visible_posters_query(poster_ids: &[String]) -> Query {
    if poster_ids.is_empty() {
        return Query::MatchNone;
    }
    let mut query = BoolQuery::new();
    for poster_id in poster_ids {
        query = query.should(Query::term(fields::POSTER_ID, poster_id));
    }
    query.build()
}

/// Single disjunctive query over both nested mention paths: user-tag ids
/// and comment commenter ids.
pub fn mentions_query(user_id: &str) -> Query {
    BoolQuery::new()
        .should(Query::term(fields::USER_TAG_ID, user_id))
        .should(Query::term(fields::COMMENT_COMMENTER_ID, user_id))
        .build()
}
