use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Plain datatypes mirroring the SQLite schema. Booleans are
// stored as INTEGER 0/1 and timestamps as unix seconds, the
// mappers module does the conversions.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub id: i64,
  pub name: String,
  pub slug: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  Live,
  InProgress,
  Completed,
  Archived,
}

impl Status {
  pub const ALL: [Status; 4] = [
    Status::Live,
    Status::InProgress,
    Status::Completed,
    Status::Archived,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Status::Live => "LIVE",
      Status::InProgress => "IN_PROGRESS",
      Status::Completed => "COMPLETED",
      Status::Archived => "ARCHIVED",
    }
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Status {
  type Err = ();

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "LIVE" => Ok(Status::Live),
      "IN_PROGRESS" => Ok(Status::InProgress),
      "COMPLETED" => Ok(Status::Completed),
      "ARCHIVED" => Ok(Status::Archived),
      _ => Err(()),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
  pub id: i64,
  pub slug: String,
  pub title: String,
  pub excerpt: String,
  pub body: String,
  pub read_time: String,
  pub category: Option<Category>,
  pub tags: Vec<String>,
  pub published: bool,
  pub published_at: Option<i64>,
  pub created_at: i64,
  pub updated_at: i64,
  pub views: i64,
  pub likes: i64,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub og_image: Option<String>,
}

// What create and update operations carry. Slugs are resolved
// separately (see db::unique_slug) so they're not in here.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
  pub title: String,
  pub excerpt: String,
  pub body: String,
  pub read_time: String,
  pub category_id: Option<i64>,
  pub tags: Vec<String>,
  pub published: bool,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub og_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  pub id: i64,
  pub slug: String,
  pub title: String,
  pub description: String,
  pub long_description: Option<String>,
  pub challenges: Option<String>,
  pub learnings: Option<String>,
  pub category: Option<Category>,
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
  pub created_at: i64,
  pub updated_at: i64,
  pub completed_at: Option<i64>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub og_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectDraft {
  pub title: String,
  pub description: String,
  pub long_description: Option<String>,
  pub challenges: Option<String>,
  pub learnings: Option<String>,
  pub category_id: Option<i64>,
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
  pub completed_at: Option<i64>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub og_image: Option<String>,
}

/// One page of articles plus counts computed over the whole
/// filtered set, pagination ignored.
#[derive(Debug)]
pub struct ArticleListing {
  pub articles: Vec<Article>,
  pub total: i64,
  pub published_count: i64,
  pub drafts_count: i64,
}

#[derive(Debug)]
pub struct ProjectListing {
  pub projects: Vec<Project>,
  pub total: i64,
  pub live_count: i64,
  pub in_progress_count: i64,
  pub completed_count: i64,
  pub archived_count: i64,
  pub featured_count: i64,
}
