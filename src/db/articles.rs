use color_eyre::Result;
use rusqlite::types::Value;
use rusqlite::{params, Connection};

use super::entities::{Article, ArticleDraft, ArticleListing};
use super::helpers::{in_placeholders, where_clause};
use super::mappers::map_article;
use super::queries::ArticleFilter;
use super::{entity_missing, select_count, select_many, select_one, Pool};
use crate::utils;
use crate::utils::time_utils;

// Column order here has to match mappers::map_article.
const ARTICLE_SELECT: &str = "SELECT articles.id, articles.slug, articles.title, \
  articles.excerpt, articles.body, articles.read_time, articles.published, \
  articles.published_at, articles.created_at, articles.updated_at, \
  articles.views, articles.likes, articles.meta_title, \
  articles.meta_description, articles.og_image, \
  categories.id, categories.name, categories.slug \
  FROM articles LEFT JOIN categories ON categories.id = articles.category_id ";

fn article_tags(pool: &Pool, article_id: i64) -> Result<Vec<String>> {
  // rowid order preserves the order tags were sent in:
  select_many(
    pool,
    "SELECT tag FROM article_tags WHERE article_id = ? ORDER BY rowid ASC",
    params![article_id],
    |row| row.get(0),
  )
}

fn with_tags(pool: &Pool, mut article: Article) -> Result<Article> {
  article.tags = article_tags(pool, article.id)?;
  Ok(article)
}

pub fn article_by_id(pool: &Pool, id: i64) -> Result<Option<Article>> {
  let article = select_one(
    pool,
    &format!("{}WHERE articles.id = ?", ARTICLE_SELECT),
    params![id],
    map_article,
  )?;
  article.map(|a| with_tags(pool, a)).transpose()
}

pub fn article_by_slug(pool: &Pool, slug: &str) -> Result<Option<Article>> {
  let article = select_one(
    pool,
    &format!("{}WHERE articles.slug = ?", ARTICLE_SELECT),
    params![slug],
    map_article,
  )?;
  article.map(|a| with_tags(pool, a)).transpose()
}

fn replace_tags(conn: &Connection, article_id: i64, tags: &[String]) -> Result<()> {
  conn.execute(
    "DELETE FROM article_tags WHERE article_id = ?",
    params![article_id],
  )?;
  for tag in tags {
    conn.execute(
      "INSERT OR IGNORE INTO article_tags (article_id, tag) VALUES (?, ?)",
      params![article_id, tag],
    )?;
  }
  Ok(())
}

/// Insert a new article with an already resolved slug. The slug
/// UNIQUE constraint can still reject it if a concurrent create
/// won the race, callers translate that into a conflict.
pub fn insert_article(pool: &Pool, draft: &ArticleDraft, slug: &str) -> Result<Article> {
  let conn = pool.clone().get()?;
  let now = time_utils::current_timestamp();
  let published_at = if draft.published { Some(now) } else { None };
  conn.execute(
    "INSERT INTO articles (slug, title, excerpt, body, read_time, category_id, \
    published, published_at, created_at, updated_at, meta_title, \
    meta_description, og_image) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      slug,
      draft.title,
      draft.excerpt,
      draft.body,
      draft.read_time,
      draft.category_id,
      utils::bool_to_i32(draft.published),
      published_at,
      now,
      now,
      draft.meta_title,
      draft.meta_description,
      draft.og_image
    ],
  )?;
  let id = conn.last_insert_rowid();
  replace_tags(&conn, id, &draft.tags)?;
  article_by_id(pool, id)?.ok_or_else(|| entity_missing("article", id))
}

/// Full update of an article. Returns None when the id doesn't
/// exist. published_at is stamped the first time the article goes
/// out published and then kept as is, unpublishing doesn't clear
/// it.
pub fn update_article(
  pool: &Pool,
  id: i64,
  draft: &ArticleDraft,
  slug: &str,
) -> Result<Option<Article>> {
  let existing = match article_by_id(pool, id)? {
    Some(article) => article,
    None => return Ok(None),
  };
  let now = time_utils::current_timestamp();
  let published_at = match (existing.published_at, draft.published) {
    (Some(stamp), _) => Some(stamp),
    (None, true) => Some(now),
    (None, false) => None,
  };
  let conn = pool.clone().get()?;
  conn.execute(
    "UPDATE articles SET slug = ?, title = ?, excerpt = ?, body = ?, \
    read_time = ?, category_id = ?, published = ?, published_at = ?, \
    updated_at = ?, meta_title = ?, meta_description = ?, og_image = ? \
    WHERE id = ?",
    params![
      slug,
      draft.title,
      draft.excerpt,
      draft.body,
      draft.read_time,
      draft.category_id,
      utils::bool_to_i32(draft.published),
      published_at,
      now,
      draft.meta_title,
      draft.meta_description,
      draft.og_image,
      id
    ],
  )?;
  replace_tags(&conn, id, &draft.tags)?;
  article_by_id(pool, id)
}

pub fn delete_article(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.clone().get()?;
  conn.execute(
    "DELETE FROM article_tags WHERE article_id = ?",
    params![id],
  )?;
  let deleted = conn.execute("DELETE FROM articles WHERE id = ?", params![id])?;
  Ok(deleted > 0)
}

/// Bulk delete, returns how many articles actually went away.
pub fn delete_articles(pool: &Pool, ids: &[i64]) -> Result<usize> {
  if ids.is_empty() {
    return Ok(0);
  }
  let conn = pool.clone().get()?;
  let placeholders = in_placeholders(ids.len());
  let params: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
  conn.execute(
    &format!(
      "DELETE FROM article_tags WHERE article_id IN ({})",
      placeholders
    ),
    params.clone(),
  )?;
  let deleted = conn.execute(
    &format!("DELETE FROM articles WHERE id IN ({})", placeholders),
    params,
  )?;
  Ok(deleted)
}

/// Unconditional views bump, one per public single-article read.
/// Separate from the read itself, so concurrent requests can
/// under-count. The counter only ever goes up though.
pub fn increment_article_views(pool: &Pool, id: i64) -> Result<()> {
  let conn = pool.clone().get()?;
  conn.execute(
    "UPDATE articles SET views = views + 1 WHERE id = ?",
    params![id],
  )?;
  Ok(())
}

pub fn increment_article_likes(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.clone().get()?;
  let updated = conn.execute(
    "UPDATE articles SET likes = likes + 1 WHERE id = ?",
    params![id],
  )?;
  Ok(updated > 0)
}

fn count_articles(
  pool: &Pool,
  clauses: &[String],
  params: &[Value],
  published: Option<bool>,
) -> Result<i64> {
  let mut clauses = clauses.to_vec();
  let mut params = params.to_vec();
  if let Some(published) = published {
    clauses.push("articles.published = ?".to_string());
    params.push(Value::Integer(if published { 1 } else { 0 }));
  }
  select_count(
    pool,
    &format!("SELECT count(*) FROM articles {}", where_clause(&clauses)),
    params,
  )
}

/// One page of articles plus counts over the whole filtered set.
/// The published/drafts breakdown reuses the exact same WHERE
/// with one extra pinned equality, before pagination.
pub fn list_articles(pool: &Pool, filter: &ArticleFilter) -> Result<ArticleListing> {
  let (clauses, params) = filter.where_parts();
  let query = format!(
    "{}{}{}{}",
    ARTICLE_SELECT,
    where_clause(&clauses),
    filter.order_clause(),
    filter.limit_clause()
  );
  let articles = select_many(pool, &query, params.clone(), map_article)?
    .into_iter()
    .map(|a| with_tags(pool, a))
    .collect::<Result<Vec<Article>>>()?;
  let total = count_articles(pool, &clauses, &params, None)?;
  let published_count = count_articles(pool, &clauses, &params, Some(true))?;
  let drafts_count = count_articles(pool, &clauses, &params, Some(false))?;
  Ok(ArticleListing {
    articles,
    total,
    published_count,
    drafts_count,
  })
}

#[cfg(test)]
mod tests {
  use super::super::test_support::test_pool;
  use super::super::{create_category, unique_slug, SlugTable};
  use super::*;
  use crate::db::queries::Order;
  use crate::utils::text_utils::slugify;

  fn draft(title: &str, published: bool, tags: &[&str]) -> ArticleDraft {
    ArticleDraft {
      title: title.to_string(),
      excerpt: "An excerpt long enough to pass".to_string(),
      body: "Body text that goes on for a while, fifty characters at least.".to_string(),
      read_time: "3 min".to_string(),
      category_id: None,
      tags: tags.iter().map(|t| t.to_string()).collect(),
      published,
      meta_title: None,
      meta_description: None,
      og_image: None,
    }
  }

  // Resolve the slug the same way the create handler does.
  fn create(pool: &Pool, article: &ArticleDraft) -> Article {
    let slug =
      unique_slug(pool, SlugTable::Articles, &slugify(&article.title), None).unwrap();
    insert_article(pool, article, &slug).unwrap()
  }

  #[test]
  fn colliding_titles_get_numbered_slugs() {
    let pool = test_pool();
    let first = create(&pool, &draft("Hello World", true, &[]));
    let second = create(&pool, &draft("Hello World", true, &[]));
    let third = create(&pool, &draft("Hello World", true, &[]));
    assert_eq!(first.slug, "hello-world");
    assert_eq!(second.slug, "hello-world-1");
    assert_eq!(third.slug, "hello-world-2");
  }

  #[test]
  fn update_with_unchanged_title_keeps_its_slug() {
    let pool = test_pool();
    let article = create(&pool, &draft("My Post", true, &[]));
    assert_eq!(article.slug, "my-post");
    // Same title, so same base slug. The search excludes the
    // article's own id and must settle on the current slug:
    let slug = unique_slug(
      &pool,
      SlugTable::Articles,
      &slugify("My Post"),
      Some(article.id),
    )
    .unwrap();
    assert_eq!(slug, "my-post");
    let mut changed = draft("My Post", true, &[]);
    changed.body = "A different body, still long enough for the fifty char rule.".to_string();
    let updated = update_article(&pool, article.id, &changed, &slug)
      .unwrap()
      .unwrap();
    assert_eq!(updated.slug, "my-post");
  }

  #[test]
  fn duplicate_slug_insert_hits_the_unique_constraint() {
    let pool = test_pool();
    create(&pool, &draft("Hello", true, &[]));
    // Bypass the pre-check, like a racing writer would:
    assert!(insert_article(&pool, &draft("Hello Again", true, &[]), "hello").is_err());
  }

  #[test]
  fn first_publish_stamps_published_at_and_unpublish_keeps_it() {
    let pool = test_pool();
    let article = create(&pool, &draft("Stamps", false, &[]));
    assert_eq!(article.published_at, None);
    let published = update_article(&pool, article.id, &draft("Stamps", true, &[]), "stamps")
      .unwrap()
      .unwrap();
    let stamp = published.published_at.expect("stamp on first publish");
    let unpublished =
      update_article(&pool, article.id, &draft("Stamps", false, &[]), "stamps")
        .unwrap()
        .unwrap();
    assert_eq!(unpublished.published_at, Some(stamp));
    assert!(!unpublished.published);
  }

  #[test]
  fn tag_filter_matches_any_listed_tag() {
    let pool = test_pool();
    let tagged = create(&pool, &draft("Styling", true, &["react", "css"]));
    let filter = ArticleFilter {
      tags: vec!["css".to_string(), "go".to_string()],
      ..ArticleFilter::default()
    };
    let listing = list_articles(&pool, &filter).unwrap();
    assert_eq!(listing.total, 1);
    assert_eq!(listing.articles[0].id, tagged.id);
    assert_eq!(listing.articles[0].tags, vec!["react", "css"]);

    let filter = ArticleFilter {
      tags: vec!["go".to_string(), "rust".to_string()],
      ..ArticleFilter::default()
    };
    assert_eq!(list_articles(&pool, &filter).unwrap().total, 0);
  }

  #[test]
  fn breakdown_counts_add_up_under_other_filters() {
    let pool = test_pool();
    let category = create_category(&pool, "Web Dev").unwrap();
    for i in 0..3 {
      let mut d = draft(&format!("Sqlite notes {}", i), i % 2 == 0, &[]);
      d.category_id = Some(category.id);
      create(&pool, &d);
    }
    // Unrelated article that must not be counted:
    create(&pool, &draft("Cooking", true, &[]));
    let filter = ArticleFilter {
      search: Some("sqlite".to_string()),
      category_slug: Some("web-dev".to_string()),
      ..ArticleFilter::default()
    };
    let listing = list_articles(&pool, &filter).unwrap();
    assert_eq!(listing.total, 3);
    assert_eq!(listing.published_count + listing.drafts_count, listing.total);
    assert_eq!(listing.published_count, 2);
  }

  #[test]
  fn search_is_case_insensitive_substring() {
    let pool = test_pool();
    create(&pool, &draft("Understanding SQLite", true, &[]));
    let filter = ArticleFilter {
      search: Some("sqlite".to_string()),
      ..ArticleFilter::default()
    };
    assert_eq!(list_articles(&pool, &filter).unwrap().total, 1);
    let filter = ArticleFilter {
      search: Some("postgres".to_string()),
      ..ArticleFilter::default()
    };
    assert_eq!(list_articles(&pool, &filter).unwrap().total, 0);
  }

  #[test]
  fn ascending_order_flips_the_page() {
    let pool = test_pool();
    let first = create(&pool, &draft("One", true, &[]));
    let second = create(&pool, &draft("Two", true, &[]));
    let filter = ArticleFilter {
      sort: Order::Asc,
      ..ArticleFilter::default()
    };
    let listing = list_articles(&pool, &filter).unwrap();
    // created_at has second precision so the id tie-break is
    // what keeps this deterministic:
    assert_eq!(listing.articles[0].id, first.id);
    assert_eq!(listing.articles[1].id, second.id);
  }

  #[test]
  fn bulk_delete_reports_actual_count() {
    let pool = test_pool();
    let a = create(&pool, &draft("A", true, &["x"]));
    let b = create(&pool, &draft("B", true, &[]));
    // One id that doesn't exist:
    let deleted = delete_articles(&pool, &[a.id, b.id, 9999]).unwrap();
    assert_eq!(deleted, 2);
    assert!(article_by_id(&pool, a.id).unwrap().is_none());
  }
}
