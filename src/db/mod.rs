use color_eyre::Result;
use eyre::{eyre, WrapErr};
use rusqlite::{params, OptionalExtension, Row, ToSql, NO_PARAMS};

pub mod entities;
pub mod queries;
mod articles;
mod helpers;
mod mappers;
mod projects;

use crate::utils::text_utils;
use entities::Category;
use mappers::map_category;

pub use articles::*;
pub use projects::*;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

// All the DB access is plain blocking rusqlite through an r2d2
// pool. Handlers that care run these through web::block.

fn select_many<T, P, F>(pool: &Pool, query: &str, params: P, mapper: F) -> Result<Vec<T>>
where
  P: IntoIterator,
  P::Item: ToSql,
  F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(query)?;
  stmt
    .query_map(params, mapper)
    .and_then(Iterator::collect)
    .context("Generic select_many query")
}

fn select_one<T, P, F>(pool: &Pool, query: &str, params: P, mapper: F) -> Result<Option<T>>
where
  P: IntoIterator,
  P::Item: ToSql,
  F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(query)?;
  stmt
    .query_row(params, mapper)
    .optional()
    .context("Generic select_one query")
}

fn select_count<P>(pool: &Pool, query: &str, params: P) -> Result<i64>
where
  P: IntoIterator,
  P::Item: ToSql,
{
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(query)?;
  let count: i64 = stmt.query_row(params, |row| row.get(0))?;
  Ok(count)
}

/// Create the tables when they don't exist yet. Booleans are
/// INTEGER 0/1, timestamps unix seconds. The UNIQUE constraints
/// on the slug columns are the authoritative uniqueness guard,
/// the pre-check in unique_slug is only best-effort.
pub fn init_schema(pool: &Pool) -> Result<()> {
  let conn = pool.clone().get()?;
  conn
    .execute_batch(
      "CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE
      );
      CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        excerpt TEXT NOT NULL,
        body TEXT NOT NULL,
        read_time TEXT NOT NULL,
        category_id INTEGER REFERENCES categories(id),
        published INTEGER NOT NULL DEFAULT 0,
        published_at INTEGER,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        views INTEGER NOT NULL DEFAULT 0,
        likes INTEGER NOT NULL DEFAULT 0,
        meta_title TEXT,
        meta_description TEXT,
        og_image TEXT
      );
      CREATE TABLE IF NOT EXISTS article_tags (
        article_id INTEGER NOT NULL REFERENCES articles(id),
        tag TEXT NOT NULL,
        PRIMARY KEY (article_id, tag)
      );
      CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        long_description TEXT,
        challenges TEXT,
        learnings TEXT,
        category_id INTEGER REFERENCES categories(id),
        status TEXT NOT NULL CHECK(
          status IN ('LIVE','IN_PROGRESS','COMPLETED','ARCHIVED')
        ),
        thumbnail TEXT,
        video_url TEXT,
        live_url TEXT,
        github_url TEXT,
        case_study_url TEXT,
        featured INTEGER NOT NULL DEFAULT 0,
        priority INTEGER NOT NULL DEFAULT 0,
        views INTEGER NOT NULL DEFAULT 0,
        likes INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        completed_at INTEGER,
        meta_title TEXT,
        meta_description TEXT,
        og_image TEXT
      );
      CREATE TABLE IF NOT EXISTS project_tech (
        project_id INTEGER NOT NULL REFERENCES projects(id),
        tech TEXT NOT NULL,
        PRIMARY KEY (project_id, tech)
      );
      CREATE TABLE IF NOT EXISTS project_images (
        project_id INTEGER NOT NULL REFERENCES projects(id),
        position INTEGER NOT NULL,
        url TEXT NOT NULL,
        PRIMARY KEY (project_id, position)
      );",
    )
    .context("Creating database schema")?;
  Ok(())
}

pub fn all_categories(pool: &Pool) -> Result<Vec<Category>> {
  select_many(
    pool,
    "SELECT id, name, slug FROM categories ORDER BY name ASC",
    NO_PARAMS,
    map_category,
  )
}

/// Create a category, deriving its slug from the name. No retry
/// loop here: a duplicate name hits the UNIQUE constraint and
/// surfaces as a conflict.
pub fn create_category(pool: &Pool, name: &str) -> Result<Category> {
  let slug = text_utils::category_slug(name);
  let conn = pool.clone().get()?;
  conn.execute(
    "INSERT INTO categories (name, slug) VALUES (?, ?)",
    params![name, slug],
  )?;
  Ok(Category {
    id: conn.last_insert_rowid(),
    name: name.to_string(),
    slug,
  })
}

/// The two collections that get retry-based slug assignment.
#[derive(Debug, Clone, Copy)]
pub enum SlugTable {
  Articles,
  Projects,
}

impl SlugTable {
  fn table_name(&self) -> &'static str {
    match self {
      SlugTable::Articles => "articles",
      SlugTable::Projects => "projects",
    }
  }
}

// Slug base when the title boiled down to nothing (an
// all-punctuation title).
const FALLBACK_SLUG_BASE: &str = "untitled";

fn slug_owner(pool: &Pool, table: SlugTable, slug: &str) -> Result<Option<i64>> {
  select_one(
    pool,
    // Fixed table names from the enum, nothing user provided:
    &format!("SELECT id FROM {} WHERE slug = ?", table.table_name()),
    params![slug],
    |row| row.get(0),
  )
}

/// Find a slug that's free in the given collection: try `base`,
/// then `base-1`, `base-2`, ... A candidate owned by `exclude_id`
/// counts as free so updates don't collide with themselves.
///
/// This check-then-act sequence is not atomic against concurrent
/// writers. Two simultaneous creates with the same title can both
/// pass the check; the UNIQUE constraint on the slug column then
/// rejects the second insert and it surfaces as a conflict.
pub fn unique_slug(
  pool: &Pool,
  table: SlugTable,
  base: &str,
  exclude_id: Option<i64>,
) -> Result<String> {
  let base = if base.is_empty() { FALLBACK_SLUG_BASE } else { base };
  let mut candidate = base.to_string();
  let mut counter = 1;
  loop {
    match slug_owner(pool, table, &candidate)? {
      None => return Ok(candidate),
      Some(id) if Some(id) == exclude_id => return Ok(candidate),
      Some(_) => {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
      }
    }
  }
}

fn entity_missing(what: &str, id: i64) -> color_eyre::Report {
  eyre!("{} {} vanished right after being written", what, id)
}


#[cfg(test)]
mod tests {
  use super::test_support::test_pool;
  use super::*;

  #[test]
  fn category_creation_derives_the_slug() {
    let pool = test_pool();
    let category = create_category(&pool, "Web  Dev!!").unwrap();
    assert_eq!(category.slug, "web-dev");
    assert_eq!(category.name, "Web  Dev!!");
  }

  #[test]
  fn duplicate_category_slug_is_a_constraint_error() {
    let pool = test_pool();
    create_category(&pool, "Web Dev").unwrap();
    // Different name, same derived slug:
    assert!(create_category(&pool, "web dev").is_err());
  }

  #[test]
  fn categories_are_listed_by_name() {
    let pool = test_pool();
    create_category(&pool, "Tools").unwrap();
    create_category(&pool, "Backend").unwrap();
    let names: Vec<String> = all_categories(&pool)
      .unwrap()
      .into_iter()
      .map(|c| c.name)
      .collect();
    assert_eq!(names, vec!["Backend".to_string(), "Tools".to_string()]);
  }

  #[test]
  fn unique_slug_leaves_free_bases_alone() {
    let pool = test_pool();
    let slug = unique_slug(&pool, SlugTable::Articles, "hello-world", None).unwrap();
    assert_eq!(slug, "hello-world");
  }

  #[test]
  fn empty_base_falls_back_to_untitled() {
    let pool = test_pool();
    let slug = unique_slug(&pool, SlugTable::Articles, "", None).unwrap();
    assert_eq!(slug, "untitled");
  }
}
