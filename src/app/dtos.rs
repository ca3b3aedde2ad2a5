use serde::{Deserialize, Serialize};

use super::error::Error;
use crate::db::entities::*;
use crate::db::queries::{
  ArticleFilter, ArticleOrderField, Order, ProjectFilter, ProjectOrderField,
};
use crate::utils::{text_utils, time_utils};

// Entities convert to DTOs with From, requests validate on the
// way in and everything is camelCase on the wire. Validation
// happens here, before any store access.

// The category entity is already exactly what we send out:
pub use crate::db::entities::Category as CategoryDto;

/* --- Responses --- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
  pub id: i64,
  pub slug: String,
  pub title: String,
  pub excerpt: String,
  pub body: String,
  pub read_time: String,
  pub category: Option<CategoryDto>,
  pub tags: Vec<String>,
  pub published: bool,
  pub published_at: Option<String>,
  pub created_at: String,
  pub updated_at: String,
  pub views: i64,
  pub likes: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meta_title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meta_description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub og_image: Option<String>,
}

impl From<Article> for ArticleDto {
  fn from(article: Article) -> Self {
    Self {
      id: article.id,
      slug: article.slug,
      title: article.title,
      excerpt: article.excerpt,
      body: article.body,
      read_time: article.read_time,
      category: article.category,
      tags: article.tags,
      published: article.published,
      published_at: article.published_at.map(time_utils::timestamp_to_rfc3339),
      created_at: time_utils::timestamp_to_rfc3339(article.created_at),
      updated_at: time_utils::timestamp_to_rfc3339(article.updated_at),
      views: article.views,
      likes: article.likes,
      meta_title: article.meta_title,
      meta_description: article.meta_description,
      og_image: article.og_image,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListingDto {
  pub articles: Vec<ArticleDto>,
  pub total: i64,
  pub published_count: i64,
  pub drafts_count: i64,
}

impl From<ArticleListing> for ArticleListingDto {
  fn from(listing: ArticleListing) -> Self {
    Self {
      articles: listing.articles.into_iter().map(Into::into).collect(),
      total: listing.total,
      published_count: listing.published_count,
      drafts_count: listing.drafts_count,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
  pub id: i64,
  pub slug: String,
  pub title: String,
  pub description: String,
  pub long_description: Option<String>,
  pub challenges: Option<String>,
  pub learnings: Option<String>,
  pub category: Option<CategoryDto>,
  pub status: Status,
  pub tech: Vec<String>,
  pub thumbnail: Option<String>,
  pub images: Vec<String>,
  pub video_url: Option<String>,
  pub live_url: Option<String>,
  pub github_url: Option<String>,
  pub case_study_url: Option<String>,
  pub featured: bool,
  pub priority: i64,
  pub views: i64,
  pub likes: i64,
  pub created_at: String,
  pub updated_at: String,
  pub completed_at: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meta_title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meta_description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub og_image: Option<String>,
}

impl From<Project> for ProjectDto {
  fn from(project: Project) -> Self {
    Self {
      id: project.id,
      slug: project.slug,
      title: project.title,
      description: project.description,
      long_description: project.long_description,
      challenges: project.challenges,
      learnings: project.learnings,
      category: project.category,
      status: project.status,
      tech: project.tech,
      thumbnail: project.thumbnail,
      images: project.images,
      video_url: project.video_url,
      live_url: project.live_url,
      github_url: project.github_url,
      case_study_url: project.case_study_url,
      featured: project.featured,
      priority: project.priority,
      views: project.views,
      likes: project.likes,
      created_at: time_utils::timestamp_to_rfc3339(project.created_at),
      updated_at: time_utils::timestamp_to_rfc3339(project.updated_at),
      completed_at: project.completed_at.map(time_utils::timestamp_to_rfc3339),
      meta_title: project.meta_title,
      meta_description: project.meta_description,
      og_image: project.og_image,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListingDto {
  pub projects: Vec<ProjectDto>,
  pub total: i64,
  pub live_count: i64,
  pub in_progress_count: i64,
  pub completed_count: i64,
  pub archived_count: i64,
  pub featured_count: i64,
}

impl From<ProjectListing> for ProjectListingDto {
  fn from(listing: ProjectListing) -> Self {
    Self {
      projects: listing.projects.into_iter().map(Into::into).collect(),
      total: listing.total,
      live_count: listing.live_count,
      in_progress_count: listing.in_progress_count,
      completed_count: listing.completed_count,
      archived_count: listing.archived_count,
      featured_count: listing.featured_count,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCountDto {
  pub deleted_count: usize,
}

/* --- Validation helpers --- */

fn min_len(field: &str, value: &str, min: usize) -> Result<(), Error> {
  if value.trim().chars().count() < min {
    Err(Error::Validation(format!(
      "{} must be at least {} characters",
      field, min
    )))
  } else {
    Ok(())
  }
}

fn check_url(field: &str, value: &Option<String>) -> Result<(), Error> {
  match value {
    Some(url) if !text_utils::is_http_url(url) => Err(Error::Validation(format!(
      "{} must be an http(s) URL",
      field
    ))),
    _ => Ok(()),
  }
}

fn parse_take(take: Option<u32>) -> Result<u32, Error> {
  let take = take.unwrap_or(10);
  // Out of range is an error, not a clamp:
  if take < 1 || take > 100 {
    Err(Error::Validation(
      "take must be between 1 and 100".to_string(),
    ))
  } else {
    Ok(take)
  }
}

fn parse_sort(sort: &Option<String>) -> Result<Order, Error> {
  match sort.as_deref() {
    None | Some("desc") => Ok(Order::Desc),
    Some("asc") => Ok(Order::Asc),
    Some(other) => Err(Error::Validation(format!(
      "sort must be asc or desc, not {}",
      other
    ))),
  }
}

fn parse_status(status: &str) -> Result<Status, Error> {
  status
    .parse()
    .map_err(|_| Error::Validation(format!("Unknown status: {}", status)))
}

// Comma-separated list in a query string parameter, empty chunks
// dropped.
fn split_list(raw: &Option<String>) -> Vec<String> {
  raw
    .as_deref()
    .map(|list| {
      list
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
    })
    .unwrap_or_default()
}

fn trimmed_list(raw: Option<Vec<String>>) -> Vec<String> {
  raw
    .unwrap_or_default()
    .into_iter()
    .map(|item| item.trim().to_string())
    .filter(|item| !item.is_empty())
    .collect()
}

// An explicit slug counts only when it's non-empty.
fn explicit_slug(raw: Option<String>) -> Option<String> {
  raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/* --- Request query objects --- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesQuery {
  pub published: Option<bool>,
  pub category: Option<String>,
  pub tags: Option<String>,
  pub search: Option<String>,
  pub take: Option<u32>,
  pub skip: Option<u32>,
  pub order_by: Option<String>,
  pub sort: Option<String>,
}

impl ArticlesQuery {
  pub fn into_filter(self) -> Result<ArticleFilter, Error> {
    let order_by = match &self.order_by {
      None => ArticleOrderField::CreatedAt,
      Some(raw) => raw
        .parse()
        .map_err(|_| Error::Validation(format!("Unknown sort field: {}", raw)))?,
    };
    Ok(ArticleFilter {
      published: self.published,
      category_slug: self.category.filter(|c| !c.is_empty()),
      tags: split_list(&self.tags),
      search: self.search.filter(|s| !s.is_empty()),
      take: parse_take(self.take)?,
      skip: self.skip.unwrap_or(0),
      order_by,
      sort: parse_sort(&self.sort)?,
    })
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsQuery {
  pub status: Option<String>,
  pub category: Option<String>,
  pub featured: Option<bool>,
  pub tech: Option<String>,
  pub search: Option<String>,
  pub take: Option<u32>,
  pub skip: Option<u32>,
  pub order_by: Option<String>,
  pub sort: Option<String>,
}

impl ProjectsQuery {
  pub fn into_filter(self) -> Result<ProjectFilter, Error> {
    let status = match &self.status {
      None => None,
      Some(raw) => Some(parse_status(raw)?),
    };
    let order_by = match &self.order_by {
      None => ProjectOrderField::Priority,
      Some(raw) => raw
        .parse()
        .map_err(|_| Error::Validation(format!("Unknown sort field: {}", raw)))?,
    };
    Ok(ProjectFilter {
      status,
      category_slug: self.category.filter(|c| !c.is_empty()),
      featured: self.featured,
      tech: split_list(&self.tech),
      search: self.search.filter(|s| !s.is_empty()),
      take: parse_take(self.take)?,
      skip: self.skip.unwrap_or(0),
      order_by,
      sort: parse_sort(&self.sort)?,
    })
  }
}

/* --- Request body objects --- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleForm {
  pub title: String,
  pub excerpt: String,
  pub slug: Option<String>,
  pub body: String,
  pub read_time: String,
  pub category_id: Option<i64>,
  pub published: bool,
  pub tags: Option<Vec<String>>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub og_image: Option<String>,
}

impl ArticleForm {
  /// Validate and split into the draft plus the explicit slug
  /// override, if one was sent.
  pub fn into_draft(self) -> Result<(ArticleDraft, Option<String>), Error> {
    min_len("title", &self.title, 3)?;
    min_len("excerpt", &self.excerpt, 10)?;
    min_len("body", &self.body, 50)?;
    min_len("readTime", &self.read_time, 1)?;
    check_url("ogImage", &self.og_image)?;
    let draft = ArticleDraft {
      title: self.title,
      excerpt: self.excerpt,
      body: self.body,
      read_time: self.read_time,
      category_id: self.category_id,
      tags: trimmed_list(self.tags),
      published: self.published,
      meta_title: self.meta_title,
      meta_description: self.meta_description,
      og_image: self.og_image,
    };
    Ok((draft, explicit_slug(self.slug)))
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
  pub title: String,
  pub description: String,
  pub slug: Option<String>,
  pub tech: Vec<String>,
  pub status: String,
  pub long_description: Option<String>,
  pub challenges: Option<String>,
  pub learnings: Option<String>,
  pub category_id: Option<i64>,
  pub thumbnail: Option<String>,
  pub images: Option<Vec<String>>,
  pub video_url: Option<String>,
  pub live_url: Option<String>,
  pub github_url: Option<String>,
  pub case_study_url: Option<String>,
  pub featured: Option<bool>,
  pub priority: Option<i64>,
  pub completed_at: Option<String>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub og_image: Option<String>,
}

impl ProjectForm {
  pub fn into_draft(self) -> Result<(ProjectDraft, Option<String>), Error> {
    min_len("title", &self.title, 3)?;
    min_len("description", &self.description, 10)?;
    let status = parse_status(&self.status)?;
    let tech = trimmed_list(Some(self.tech));
    if tech.is_empty() {
      return Err(Error::Validation(
        "At least one tech entry is required".to_string(),
      ));
    }
    check_url("thumbnail", &self.thumbnail)?;
    check_url("videoUrl", &self.video_url)?;
    check_url("liveUrl", &self.live_url)?;
    check_url("githubUrl", &self.github_url)?;
    check_url("caseStudyUrl", &self.case_study_url)?;
    check_url("ogImage", &self.og_image)?;
    let images = trimmed_list(self.images);
    for image in &images {
      check_url("images", &Some(image.clone()))?;
    }
    let completed_at = match &self.completed_at {
      None => None,
      Some(raw) => Some(time_utils::parse_rfc3339(raw).ok_or_else(|| {
        Error::Validation("completedAt must be an RFC 3339 date".to_string())
      })?),
    };
    let draft = ProjectDraft {
      title: self.title,
      description: self.description,
      long_description: self.long_description,
      challenges: self.challenges,
      learnings: self.learnings,
      category_id: self.category_id,
      status,
      tech,
      thumbnail: self.thumbnail,
      images,
      video_url: self.video_url,
      live_url: self.live_url,
      github_url: self.github_url,
      case_study_url: self.case_study_url,
      featured: self.featured.unwrap_or(false),
      priority: self.priority.unwrap_or(0),
      completed_at,
      meta_title: self.meta_title,
      meta_description: self.meta_description,
      og_image: self.og_image,
    };
    Ok((draft, explicit_slug(self.slug)))
  }
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
  pub name: String,
}

impl CategoryForm {
  pub fn validate(&self) -> Result<(), Error> {
    min_len("name", &self.name, 2)
  }
}

#[derive(Debug, Deserialize)]
pub struct DeleteManyForm {
  pub ids: Vec<i64>,
}

impl DeleteManyForm {
  pub fn validate(&self) -> Result<(), Error> {
    if self.ids.is_empty() {
      Err(Error::Validation("ids cannot be empty".to_string()))
    } else {
      Ok(())
    }
  }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactForm {
  pub name: String,
  pub email: String,
  pub subject: String,
  pub message: String,
}

impl ContactForm {
  pub fn validate(&self) -> Result<(), Error> {
    min_len("name", &self.name, 2)?;
    if !text_utils::is_email(self.email.trim()) {
      return Err(Error::Validation(
        "Please enter a valid email".to_string(),
      ));
    }
    min_len("subject", &self.subject, 5)?;
    min_len("message", &self.message, 10)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn articles_query() -> ArticlesQuery {
    ArticlesQuery {
      published: None,
      category: None,
      tags: None,
      search: None,
      take: None,
      skip: None,
      order_by: None,
      sort: None,
    }
  }

  fn project_form() -> ProjectForm {
    ProjectForm {
      title: "A project".to_string(),
      description: "Long enough description".to_string(),
      slug: None,
      tech: vec!["rust".to_string()],
      status: "LIVE".to_string(),
      long_description: None,
      challenges: None,
      learnings: None,
      category_id: None,
      thumbnail: None,
      images: None,
      video_url: None,
      live_url: None,
      github_url: None,
      case_study_url: None,
      featured: None,
      priority: None,
      completed_at: None,
      meta_title: None,
      meta_description: None,
      og_image: None,
    }
  }

  #[test]
  fn take_out_of_range_is_rejected_not_clamped() {
    let mut query = articles_query();
    query.take = Some(0);
    assert!(query.into_filter().is_err());
    let mut query = articles_query();
    query.take = Some(101);
    assert!(query.into_filter().is_err());
    let mut query = articles_query();
    query.take = Some(100);
    assert_eq!(query.into_filter().unwrap().take, 100);
  }

  #[test]
  fn take_defaults_to_ten() {
    let filter = articles_query().into_filter().unwrap();
    assert_eq!(filter.take, 10);
    assert_eq!(filter.skip, 0);
  }

  #[test]
  fn unknown_sort_field_is_rejected() {
    let mut query = articles_query();
    query.order_by = Some("slug".to_string());
    assert!(query.into_filter().is_err());
  }

  #[test]
  fn tags_parameter_is_comma_separated() {
    let mut query = articles_query();
    query.tags = Some("react, css,,go ".to_string());
    let filter = query.into_filter().unwrap();
    assert_eq!(filter.tags, vec!["react", "css", "go"]);
  }

  #[test]
  fn article_form_enforces_min_lengths() {
    let form = ArticleForm {
      title: "Hi".to_string(),
      excerpt: "An excerpt long enough".to_string(),
      slug: None,
      body: "b".repeat(60),
      read_time: "3 min".to_string(),
      category_id: None,
      published: false,
      tags: None,
      meta_title: None,
      meta_description: None,
      og_image: None,
    };
    // Title has only 2 characters:
    assert!(form.into_draft().is_err());
  }

  #[test]
  fn project_form_requires_tech_and_valid_status() {
    let mut form = project_form();
    form.tech = vec!["  ".to_string()];
    assert!(form.into_draft().is_err());

    let mut form = project_form();
    form.status = "SHIPPED".to_string();
    assert!(form.into_draft().is_err());
  }

  #[test]
  fn project_form_checks_url_fields() {
    let mut form = project_form();
    form.live_url = Some("not a url".to_string());
    assert!(form.into_draft().is_err());

    let mut form = project_form();
    form.live_url = Some("https://example.com".to_string());
    let (draft, _) = form.into_draft().unwrap();
    assert_eq!(draft.live_url.as_deref(), Some("https://example.com"));
  }

  #[test]
  fn project_form_parses_completed_at() {
    let mut form = project_form();
    form.completed_at = Some("2024-03-01T00:00:00+00:00".to_string());
    let (draft, _) = form.into_draft().unwrap();
    assert!(draft.completed_at.is_some());

    let mut form = project_form();
    form.completed_at = Some("last spring".to_string());
    assert!(form.into_draft().is_err());
  }

  #[test]
  fn blank_explicit_slug_means_derive_from_title() {
    let mut form = project_form();
    form.slug = Some("   ".to_string());
    let (_, slug) = form.into_draft().unwrap();
    assert_eq!(slug, None);
  }

  #[test]
  fn contact_form_rejects_bad_emails() {
    let form = ContactForm {
      name: "Someone".to_string(),
      email: "nope".to_string(),
      subject: "A subject".to_string(),
      message: "A long enough message".to_string(),
    };
    assert!(form.validate().is_err());
  }
}
