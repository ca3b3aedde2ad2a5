use color_eyre::Result;
use rusqlite::types::Value;
use rusqlite::{params, Connection};

use super::entities::{Project, ProjectDraft, ProjectListing, Status};
use super::helpers::{in_placeholders, where_clause};
use super::mappers::map_project;
use super::queries::ProjectFilter;
use super::{entity_missing, select_count, select_many, select_one, Pool};
use crate::utils;
use crate::utils::time_utils;

// Column order here has to match mappers::map_project.
const PROJECT_SELECT: &str = "SELECT projects.id, projects.slug, projects.title, \
  projects.description, projects.long_description, projects.challenges, \
  projects.learnings, projects.status, projects.thumbnail, projects.video_url, \
  projects.live_url, projects.github_url, projects.case_study_url, \
  projects.featured, projects.priority, projects.views, projects.likes, \
  projects.created_at, projects.updated_at, projects.completed_at, \
  projects.meta_title, projects.meta_description, projects.og_image, \
  categories.id, categories.name, categories.slug \
  FROM projects LEFT JOIN categories ON categories.id = projects.category_id ";

fn project_tech(pool: &Pool, project_id: i64) -> Result<Vec<String>> {
  select_many(
    pool,
    "SELECT tech FROM project_tech WHERE project_id = ? ORDER BY rowid ASC",
    params![project_id],
    |row| row.get(0),
  )
}

fn project_images(pool: &Pool, project_id: i64) -> Result<Vec<String>> {
  select_many(
    pool,
    "SELECT url FROM project_images WHERE project_id = ? ORDER BY position ASC",
    params![project_id],
    |row| row.get(0),
  )
}

fn with_details(pool: &Pool, mut project: Project) -> Result<Project> {
  project.tech = project_tech(pool, project.id)?;
  project.images = project_images(pool, project.id)?;
  Ok(project)
}

pub fn project_by_id(pool: &Pool, id: i64) -> Result<Option<Project>> {
  let project = select_one(
    pool,
    &format!("{}WHERE projects.id = ?", PROJECT_SELECT),
    params![id],
    map_project,
  )?;
  project.map(|p| with_details(pool, p)).transpose()
}

pub fn project_by_slug(pool: &Pool, slug: &str) -> Result<Option<Project>> {
  let project = select_one(
    pool,
    &format!("{}WHERE projects.slug = ?", PROJECT_SELECT),
    params![slug],
    map_project,
  )?;
  project.map(|p| with_details(pool, p)).transpose()
}

fn replace_details(conn: &Connection, project_id: i64, draft: &ProjectDraft) -> Result<()> {
  conn.execute(
    "DELETE FROM project_tech WHERE project_id = ?",
    params![project_id],
  )?;
  for tech in &draft.tech {
    conn.execute(
      "INSERT OR IGNORE INTO project_tech (project_id, tech) VALUES (?, ?)",
      params![project_id, tech],
    )?;
  }
  conn.execute(
    "DELETE FROM project_images WHERE project_id = ?",
    params![project_id],
  )?;
  for (position, url) in draft.images.iter().enumerate() {
    conn.execute(
      "INSERT INTO project_images (project_id, position, url) VALUES (?, ?, ?)",
      params![project_id, position as i64, url],
    )?;
  }
  Ok(())
}

/// Insert a new project with an already resolved slug. Same race
/// window as articles, the UNIQUE constraint has the final word.
pub fn insert_project(pool: &Pool, draft: &ProjectDraft, slug: &str) -> Result<Project> {
  let conn = pool.clone().get()?;
  let now = time_utils::current_timestamp();
  conn.execute(
    "INSERT INTO projects (slug, title, description, long_description, \
    challenges, learnings, category_id, status, thumbnail, video_url, \
    live_url, github_url, case_study_url, featured, priority, created_at, \
    updated_at, completed_at, meta_title, meta_description, og_image) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      slug,
      draft.title,
      draft.description,
      draft.long_description,
      draft.challenges,
      draft.learnings,
      draft.category_id,
      draft.status.as_str(),
      draft.thumbnail,
      draft.video_url,
      draft.live_url,
      draft.github_url,
      draft.case_study_url,
      utils::bool_to_i32(draft.featured),
      draft.priority,
      now,
      now,
      draft.completed_at,
      draft.meta_title,
      draft.meta_description,
      draft.og_image
    ],
  )?;
  let id = conn.last_insert_rowid();
  replace_details(&conn, id, draft)?;
  project_by_id(pool, id)?.ok_or_else(|| entity_missing("project", id))
}

/// Full update of a project. Returns None when the id doesn't
/// exist. Status is freely settable, there are no transition
/// rules, and completed_at is whatever the draft says.
pub fn update_project(
  pool: &Pool,
  id: i64,
  draft: &ProjectDraft,
  slug: &str,
) -> Result<Option<Project>> {
  if project_by_id(pool, id)?.is_none() {
    return Ok(None);
  }
  let now = time_utils::current_timestamp();
  let conn = pool.clone().get()?;
  conn.execute(
    "UPDATE projects SET slug = ?, title = ?, description = ?, \
    long_description = ?, challenges = ?, learnings = ?, category_id = ?, \
    status = ?, thumbnail = ?, video_url = ?, live_url = ?, github_url = ?, \
    case_study_url = ?, featured = ?, priority = ?, updated_at = ?, \
    completed_at = ?, meta_title = ?, meta_description = ?, og_image = ? \
    WHERE id = ?",
    params![
      slug,
      draft.title,
      draft.description,
      draft.long_description,
      draft.challenges,
      draft.learnings,
      draft.category_id,
      draft.status.as_str(),
      draft.thumbnail,
      draft.video_url,
      draft.live_url,
      draft.github_url,
      draft.case_study_url,
      utils::bool_to_i32(draft.featured),
      draft.priority,
      now,
      draft.completed_at,
      draft.meta_title,
      draft.meta_description,
      draft.og_image,
      id
    ],
  )?;
  replace_details(&conn, id, draft)?;
  project_by_id(pool, id)
}

pub fn delete_project(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.clone().get()?;
  conn.execute(
    "DELETE FROM project_tech WHERE project_id = ?",
    params![id],
  )?;
  conn.execute(
    "DELETE FROM project_images WHERE project_id = ?",
    params![id],
  )?;
  let deleted = conn.execute("DELETE FROM projects WHERE id = ?", params![id])?;
  Ok(deleted > 0)
}

pub fn delete_projects(pool: &Pool, ids: &[i64]) -> Result<usize> {
  if ids.is_empty() {
    return Ok(0);
  }
  let conn = pool.clone().get()?;
  let placeholders = in_placeholders(ids.len());
  let params: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
  conn.execute(
    &format!(
      "DELETE FROM project_tech WHERE project_id IN ({})",
      placeholders
    ),
    params.clone(),
  )?;
  conn.execute(
    &format!(
      "DELETE FROM project_images WHERE project_id IN ({})",
      placeholders
    ),
    params.clone(),
  )?;
  let deleted = conn.execute(
    &format!("DELETE FROM projects WHERE id IN ({})", placeholders),
    params,
  )?;
  Ok(deleted)
}

/// See increment_article_views, same deal.
pub fn increment_project_views(pool: &Pool, id: i64) -> Result<()> {
  let conn = pool.clone().get()?;
  conn.execute(
    "UPDATE projects SET views = views + 1 WHERE id = ?",
    params![id],
  )?;
  Ok(())
}

pub fn increment_project_likes(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.clone().get()?;
  let updated = conn.execute(
    "UPDATE projects SET likes = likes + 1 WHERE id = ?",
    params![id],
  )?;
  Ok(updated > 0)
}

enum CountPin {
  None,
  Status(Status),
  Featured,
}

fn count_projects(
  pool: &Pool,
  clauses: &[String],
  params: &[Value],
  pin: CountPin,
) -> Result<i64> {
  let mut clauses = clauses.to_vec();
  let mut params = params.to_vec();
  match pin {
    CountPin::None => {}
    CountPin::Status(status) => {
      clauses.push("projects.status = ?".to_string());
      params.push(Value::Text(status.as_str().to_string()));
    }
    CountPin::Featured => {
      clauses.push("projects.featured = 1".to_string());
    }
  }
  select_count(
    pool,
    &format!("SELECT count(*) FROM projects {}", where_clause(&clauses)),
    params,
  )
}

/// One page of projects plus the per-status and featured counts
/// over the whole filtered set, pagination ignored.
pub fn list_projects(pool: &Pool, filter: &ProjectFilter) -> Result<ProjectListing> {
  let (clauses, params) = filter.where_parts();
  let query = format!(
    "{}{}{}{}",
    PROJECT_SELECT,
    where_clause(&clauses),
    filter.order_clause(),
    filter.limit_clause()
  );
  let projects = select_many(pool, &query, params.clone(), map_project)?
    .into_iter()
    .map(|p| with_details(pool, p))
    .collect::<Result<Vec<Project>>>()?;
  let total = count_projects(pool, &clauses, &params, CountPin::None)?;
  let live_count = count_projects(pool, &clauses, &params, CountPin::Status(Status::Live))?;
  let in_progress_count =
    count_projects(pool, &clauses, &params, CountPin::Status(Status::InProgress))?;
  let completed_count =
    count_projects(pool, &clauses, &params, CountPin::Status(Status::Completed))?;
  let archived_count =
    count_projects(pool, &clauses, &params, CountPin::Status(Status::Archived))?;
  let featured_count = count_projects(pool, &clauses, &params, CountPin::Featured)?;
  Ok(ProjectListing {
    projects,
    total,
    live_count,
    in_progress_count,
    completed_count,
    archived_count,
    featured_count,
  })
}

#[cfg(test)]
mod tests {
  use super::super::test_support::test_pool;
  use super::super::{unique_slug, SlugTable};
  use super::*;
  use crate::utils::text_utils::slugify;

  fn draft(title: &str, status: Status, tech: &[&str]) -> ProjectDraft {
    ProjectDraft {
      title: title.to_string(),
      description: "A description long enough".to_string(),
      long_description: None,
      challenges: None,
      learnings: None,
      category_id: None,
      status,
      tech: tech.iter().map(|t| t.to_string()).collect(),
      thumbnail: None,
      images: Vec::new(),
      video_url: None,
      live_url: None,
      github_url: None,
      case_study_url: None,
      featured: false,
      priority: 0,
      completed_at: None,
      meta_title: None,
      meta_description: None,
      og_image: None,
    }
  }

  fn create(pool: &Pool, project: &ProjectDraft) -> Project {
    let slug =
      unique_slug(pool, SlugTable::Projects, &slugify(&project.title), None).unwrap();
    insert_project(pool, project, &slug).unwrap()
  }

  #[test]
  fn total_ignores_pagination() {
    let pool = test_pool();
    for i in 0..3 {
      create(&pool, &draft(&format!("Live thing {}", i), Status::Live, &["rust"]));
    }
    create(&pool, &draft("Archived thing", Status::Archived, &["rust"]));
    let filter = ProjectFilter {
      status: Some(Status::Live),
      take: 1,
      skip: 0,
      ..ProjectFilter::default()
    };
    let listing = list_projects(&pool, &filter).unwrap();
    assert_eq!(listing.projects.len(), 1);
    assert_eq!(listing.total, 3);
    assert_eq!(listing.live_count, 3);
    assert_eq!(listing.archived_count, 0);
  }

  #[test]
  fn status_and_featured_breakdowns_ignore_pagination_too() {
    let pool = test_pool();
    create(&pool, &draft("One", Status::Live, &["rust"]));
    create(&pool, &draft("Two", Status::InProgress, &["rust"]));
    let mut featured = draft("Three", Status::Completed, &["rust"]);
    featured.featured = true;
    create(&pool, &featured);
    let filter = ProjectFilter {
      take: 1,
      ..ProjectFilter::default()
    };
    let listing = list_projects(&pool, &filter).unwrap();
    assert_eq!(listing.total, 3);
    assert_eq!(listing.live_count, 1);
    assert_eq!(listing.in_progress_count, 1);
    assert_eq!(listing.completed_count, 1);
    assert_eq!(listing.archived_count, 0);
    assert_eq!(listing.featured_count, 1);
  }

  #[test]
  fn sequential_view_reads_bump_the_counter_exactly() {
    let pool = test_pool();
    let project = create(&pool, &draft("Counter", Status::Live, &["rust"]));
    for _ in 0..5 {
      // The read-then-increment the single-project handler does:
      let found = project_by_slug(&pool, "counter").unwrap().unwrap();
      increment_project_views(&pool, found.id).unwrap();
    }
    let found = project_by_id(&pool, project.id).unwrap().unwrap();
    assert_eq!(found.views, 5);
  }

  #[test]
  fn tech_filter_matches_any_listed_entry() {
    let pool = test_pool();
    create(&pool, &draft("Site", Status::Live, &["react", "css"]));
    let filter = ProjectFilter {
      tech: vec!["css".to_string(), "go".to_string()],
      ..ProjectFilter::default()
    };
    assert_eq!(list_projects(&pool, &filter).unwrap().total, 1);
    let filter = ProjectFilter {
      tech: vec!["go".to_string(), "rust".to_string()],
      ..ProjectFilter::default()
    };
    assert_eq!(list_projects(&pool, &filter).unwrap().total, 0);
  }

  #[test]
  fn search_also_matches_exact_tech_entries() {
    let pool = test_pool();
    create(&pool, &draft("Some Tool", Status::Live, &["rust", "sqlite"]));
    let filter = ProjectFilter {
      search: Some("sqlite".to_string()),
      ..ProjectFilter::default()
    };
    assert_eq!(list_projects(&pool, &filter).unwrap().total, 1);
  }

  #[test]
  fn priority_is_the_default_sort_key() {
    let pool = test_pool();
    let mut low = draft("Low", Status::Live, &["rust"]);
    low.priority = 1;
    let mut high = draft("High", Status::Live, &["rust"]);
    high.priority = 10;
    create(&pool, &low);
    let high = create(&pool, &high);
    let listing = list_projects(&pool, &ProjectFilter::default()).unwrap();
    assert_eq!(listing.projects[0].id, high.id);
  }

  #[test]
  fn images_keep_their_order() {
    let pool = test_pool();
    let mut with_images = draft("Gallery", Status::Live, &["rust"]);
    with_images.images = vec![
      "https://example.com/1.png".to_string(),
      "https://example.com/2.png".to_string(),
      "https://example.com/3.png".to_string(),
    ];
    let project = create(&pool, &with_images);
    assert_eq!(project.images.len(), 3);
    assert_eq!(project.images[0], "https://example.com/1.png");
    assert_eq!(project.images[2], "https://example.com/3.png");
  }

  #[test]
  fn update_of_missing_project_reports_none() {
    let pool = test_pool();
    let result = update_project(&pool, 42, &draft("Ghost", Status::Live, &["rust"]), "ghost");
    assert!(result.unwrap().is_none());
  }
}
