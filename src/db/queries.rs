use super::helpers::in_placeholders;
use crate::db::entities::Status;
use crate::utils::text_utils;
use rusqlite::types::Value;
use std::str::FromStr;

// Listing filters. Every optional filter is an explicit field
// here and gets turned into a WHERE fragment plus positional
// params, so nothing user-provided is ever spliced into the SQL
// itself. Order fields are closed enums for the same reason.

pub enum Order {
  Asc,
  Desc,
}

impl Order {
  pub fn as_sql(&self) -> &'static str {
    match self {
      Order::Asc => "ASC",
      Order::Desc => "DESC",
    }
  }
}

pub enum ArticleOrderField {
  CreatedAt,
  UpdatedAt,
  PublishedAt,
  Views,
  Likes,
}

impl ArticleOrderField {
  fn column(&self) -> &'static str {
    match self {
      ArticleOrderField::CreatedAt => "created_at",
      ArticleOrderField::UpdatedAt => "updated_at",
      ArticleOrderField::PublishedAt => "published_at",
      ArticleOrderField::Views => "views",
      ArticleOrderField::Likes => "likes",
    }
  }
}

// The API uses the camelCase field names clients already know
// from the JSON payloads.
impl FromStr for ArticleOrderField {
  type Err = ();

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "createdAt" => Ok(ArticleOrderField::CreatedAt),
      "updatedAt" => Ok(ArticleOrderField::UpdatedAt),
      "publishedAt" => Ok(ArticleOrderField::PublishedAt),
      "views" => Ok(ArticleOrderField::Views),
      "likes" => Ok(ArticleOrderField::Likes),
      _ => Err(()),
    }
  }
}

pub enum ProjectOrderField {
  Priority,
  CreatedAt,
  UpdatedAt,
  Views,
  Likes,
  CompletedAt,
}

impl ProjectOrderField {
  fn column(&self) -> &'static str {
    match self {
      ProjectOrderField::Priority => "priority",
      ProjectOrderField::CreatedAt => "created_at",
      ProjectOrderField::UpdatedAt => "updated_at",
      ProjectOrderField::Views => "views",
      ProjectOrderField::Likes => "likes",
      ProjectOrderField::CompletedAt => "completed_at",
    }
  }
}

impl FromStr for ProjectOrderField {
  type Err = ();

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "priority" => Ok(ProjectOrderField::Priority),
      "createdAt" => Ok(ProjectOrderField::CreatedAt),
      "updatedAt" => Ok(ProjectOrderField::UpdatedAt),
      "views" => Ok(ProjectOrderField::Views),
      "likes" => Ok(ProjectOrderField::Likes),
      "completedAt" => Ok(ProjectOrderField::CompletedAt),
      _ => Err(()),
    }
  }
}

// Search is case-insensitive substring match on both entity
// types (the LIKE below relies on SQLite's default ASCII
// case folding). Wildcards in the needle are escaped.
fn like_param(needle: &str) -> Value {
  Value::Text(format!("%{}%", text_utils::escape_like(needle)))
}

pub struct ArticleFilter {
  pub published: Option<bool>,
  pub category_slug: Option<String>,
  /// Match-any: an article matches if it carries at least one
  /// of these tags.
  pub tags: Vec<String>,
  pub search: Option<String>,
  pub take: u32,
  pub skip: u32,
  pub order_by: ArticleOrderField,
  pub sort: Order,
}

impl Default for ArticleFilter {
  fn default() -> Self {
    Self {
      published: None,
      category_slug: None,
      tags: Vec::new(),
      search: None,
      take: 10,
      skip: 0,
      order_by: ArticleOrderField::CreatedAt,
      sort: Order::Desc,
    }
  }
}

impl ArticleFilter {
  pub fn where_parts(&self) -> (Vec<String>, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    if let Some(published) = self.published {
      clauses.push("articles.published = ?".to_string());
      params.push(Value::Integer(if published { 1 } else { 0 }));
    }
    if let Some(slug) = &self.category_slug {
      clauses.push(
        "articles.category_id IN (SELECT id FROM categories WHERE slug = ?)".to_string(),
      );
      params.push(Value::Text(slug.clone()));
    }
    if !self.tags.is_empty() {
      clauses.push(format!(
        "EXISTS (SELECT 1 FROM article_tags \
        WHERE article_tags.article_id = articles.id \
        AND article_tags.tag IN ({}))",
        in_placeholders(self.tags.len())
      ));
      for tag in &self.tags {
        params.push(Value::Text(tag.clone()));
      }
    }
    if let Some(search) = &self.search {
      clauses.push(
        "(articles.title LIKE ? ESCAPE '\\' \
        OR articles.excerpt LIKE ? ESCAPE '\\' \
        OR articles.body LIKE ? ESCAPE '\\')"
          .to_string(),
      );
      for _ in 0..3 {
        params.push(like_param(search));
      }
    }
    (clauses, params)
  }

  // The id tie-break keeps pagination deterministic when the
  // primary sort column has equal values.
  pub fn order_clause(&self) -> String {
    format!(
      "ORDER BY articles.{} {}, articles.id {} ",
      self.order_by.column(),
      self.sort.as_sql(),
      self.sort.as_sql()
    )
  }

  // take and skip are validated at the DTO boundary, safe to
  // interpolate here.
  pub fn limit_clause(&self) -> String {
    format!("LIMIT {} OFFSET {} ", self.take, self.skip)
  }
}

pub struct ProjectFilter {
  pub status: Option<Status>,
  pub category_slug: Option<String>,
  pub featured: Option<bool>,
  /// Match-any, same semantics as article tags.
  pub tech: Vec<String>,
  pub search: Option<String>,
  pub take: u32,
  pub skip: u32,
  pub order_by: ProjectOrderField,
  pub sort: Order,
}

impl Default for ProjectFilter {
  fn default() -> Self {
    Self {
      status: None,
      category_slug: None,
      featured: None,
      tech: Vec::new(),
      search: None,
      take: 10,
      skip: 0,
      order_by: ProjectOrderField::Priority,
      sort: Order::Desc,
    }
  }
}

impl ProjectFilter {
  pub fn where_parts(&self) -> (Vec<String>, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    if let Some(status) = self.status {
      clauses.push("projects.status = ?".to_string());
      params.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(slug) = &self.category_slug {
      clauses.push(
        "projects.category_id IN (SELECT id FROM categories WHERE slug = ?)".to_string(),
      );
      params.push(Value::Text(slug.clone()));
    }
    if let Some(featured) = self.featured {
      clauses.push("projects.featured = ?".to_string());
      params.push(Value::Integer(if featured { 1 } else { 0 }));
    }
    if !self.tech.is_empty() {
      clauses.push(format!(
        "EXISTS (SELECT 1 FROM project_tech \
        WHERE project_tech.project_id = projects.id \
        AND project_tech.tech IN ({}))",
        in_placeholders(self.tech.len())
      ));
      for tech in &self.tech {
        params.push(Value::Text(tech.clone()));
      }
    }
    if let Some(search) = &self.search {
      // On top of the text columns, a search term that exactly
      // matches a tech entry matches the project too.
      clauses.push(
        "(projects.title LIKE ? ESCAPE '\\' \
        OR projects.description LIKE ? ESCAPE '\\' \
        OR projects.long_description LIKE ? ESCAPE '\\' \
        OR projects.challenges LIKE ? ESCAPE '\\' \
        OR projects.learnings LIKE ? ESCAPE '\\' \
        OR EXISTS (SELECT 1 FROM project_tech \
        WHERE project_tech.project_id = projects.id \
        AND project_tech.tech = ?))"
          .to_string(),
      );
      for _ in 0..5 {
        params.push(like_param(search));
      }
      params.push(Value::Text(search.clone()));
    }
    (clauses, params)
  }

  pub fn order_clause(&self) -> String {
    format!(
      "ORDER BY projects.{} {}, projects.id {} ",
      self.order_by.column(),
      self.sort.as_sql(),
      self.sort.as_sql()
    )
  }

  pub fn limit_clause(&self) -> String {
    format!("LIMIT {} OFFSET {} ", self.take, self.skip)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_article_filter_has_no_clauses() {
    let filter = ArticleFilter::default();
    let (clauses, params) = filter.where_parts();
    assert!(clauses.is_empty());
    assert!(params.is_empty());
    assert_eq!(filter.order_clause(), "ORDER BY articles.created_at DESC, articles.id DESC ");
    assert_eq!(filter.limit_clause(), "LIMIT 10 OFFSET 0 ");
  }

  #[test]
  fn article_filter_emits_one_param_per_tag() {
    let filter = ArticleFilter {
      tags: vec!["react".to_string(), "css".to_string()],
      ..ArticleFilter::default()
    };
    let (clauses, params) = filter.where_parts();
    assert_eq!(clauses.len(), 1);
    assert!(clauses[0].contains("IN (?,?)"));
    assert_eq!(params.len(), 2);
  }

  #[test]
  fn article_search_params_carry_escaped_wildcards() {
    let filter = ArticleFilter {
      search: Some("50%".to_string()),
      ..ArticleFilter::default()
    };
    let (clauses, params) = filter.where_parts();
    assert_eq!(clauses.len(), 1);
    assert_eq!(params.len(), 3);
    assert_eq!(params[0], Value::Text("%50\\%%".to_string()));
  }

  #[test]
  fn project_filter_stacks_all_clauses() {
    let filter = ProjectFilter {
      status: Some(Status::Live),
      category_slug: Some("web".to_string()),
      featured: Some(true),
      tech: vec!["rust".to_string()],
      search: Some("sqlite".to_string()),
      ..ProjectFilter::default()
    };
    let (clauses, params) = filter.where_parts();
    assert_eq!(clauses.len(), 5);
    // status + category + featured + 1 tech + 5 LIKEs + exact tech:
    assert_eq!(params.len(), 10);
  }

  #[test]
  fn project_default_order_is_priority_desc() {
    let filter = ProjectFilter::default();
    assert_eq!(filter.order_clause(), "ORDER BY projects.priority DESC, projects.id DESC ");
  }
}
