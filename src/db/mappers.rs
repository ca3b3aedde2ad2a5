use super::entities::*;
use rusqlite::types::Type;
use rusqlite::{Error, Row};

// Row to entity conversions. Column order must match the SELECT
// lists in the articles and projects modules.

pub fn map_category(row: &Row) -> Result<Category, Error> {
  Ok(Category {
    id: row.get(0)?,
    name: row.get(1)?,
    slug: row.get(2)?,
  })
}

// Categories come from a LEFT JOIN so all three columns are
// nullable at once.
fn map_joined_category(
  row: &Row,
  first_index: usize,
) -> Result<Option<Category>, Error> {
  let id: Option<i64> = row.get(first_index)?;
  match id {
    Some(id) => Ok(Some(Category {
      id,
      name: row.get(first_index + 1)?,
      slug: row.get(first_index + 2)?,
    })),
    None => Ok(None),
  }
}

/// Maps an article row. Tags are stored in their own table and
/// filled in by the caller afterwards.
pub fn map_article(row: &Row) -> Result<Article, Error> {
  Ok(Article {
    id: row.get(0)?,
    slug: row.get(1)?,
    title: row.get(2)?,
    excerpt: row.get(3)?,
    body: row.get(4)?,
    read_time: row.get(5)?,
    published: row.get::<_, i32>(6)? != 0,
    published_at: row.get(7)?,
    created_at: row.get(8)?,
    updated_at: row.get(9)?,
    views: row.get(10)?,
    likes: row.get(11)?,
    meta_title: row.get(12)?,
    meta_description: row.get(13)?,
    og_image: row.get(14)?,
    category: map_joined_category(row, 15)?,
    tags: Vec::new(),
  })
}

/// Maps a project row. Tech and images live in their own tables
/// and are filled in by the caller.
pub fn map_project(row: &Row) -> Result<Project, Error> {
  let status_text: String = row.get(7)?;
  let status = status_text.parse::<Status>().map_err(|_| {
    // The CHECK constraint should make this impossible:
    Error::FromSqlConversionFailure(
      7,
      Type::Text,
      Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("unknown project status: {}", status_text),
      )),
    )
  })?;
  Ok(Project {
    id: row.get(0)?,
    slug: row.get(1)?,
    title: row.get(2)?,
    description: row.get(3)?,
    long_description: row.get(4)?,
    challenges: row.get(5)?,
    learnings: row.get(6)?,
    status,
    thumbnail: row.get(8)?,
    video_url: row.get(9)?,
    live_url: row.get(10)?,
    github_url: row.get(11)?,
    case_study_url: row.get(12)?,
    featured: row.get::<_, i32>(13)? != 0,
    priority: row.get(14)?,
    views: row.get(15)?,
    likes: row.get(16)?,
    created_at: row.get(17)?,
    updated_at: row.get(18)?,
    completed_at: row.get(19)?,
    meta_title: row.get(20)?,
    meta_description: row.get(21)?,
    og_image: row.get(22)?,
    category: map_joined_category(row, 23)?,
    tech: Vec::new(),
    images: Vec::new(),
  })
}
