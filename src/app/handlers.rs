use actix_web::{web, HttpResponse, Result};
use handlebars::Handlebars;
use log::error;

use super::dtos::*;
use super::error::{map_db_error, Error};
use super::mailer::ContactEmailData;
use super::AppState;
use crate::db::{self, SlugTable};
use crate::utils::text_utils;

// All the API handlers. Everything data-related follows the same
// recipe: validate the input DTO, call a db function, translate
// store faults with map_db_error, convert the entity to a DTO.

pub async fn index() -> HttpResponse {
  HttpResponse::Ok().body("Nothing here")
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}

// The admin guard can only make routes not match, so rejected
// requests land here via the unguarded fallback scope and get the
// actual challenge.
pub async fn auth_required() -> HttpResponse {
  HttpResponse::Unauthorized()
    .header("WWW-Authenticate", "Basic realm=\"Admin area\"")
    .body("Authentication required")
}

/* --- Categories --- */

pub async fn categories(app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
  let categories = db::all_categories(&app_state.pool).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(categories))
}

pub async fn create_category(
  app_state: web::Data<AppState>,
  form: web::Json<CategoryForm>,
) -> Result<HttpResponse, Error> {
  form.validate()?;
  let category =
    db::create_category(&app_state.pool, form.name.trim()).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(category))
}

/* --- Articles --- */

// Public listing only ever serves published articles, whatever
// else the query string says.
pub async fn articles(
  app_state: web::Data<AppState>,
  query: web::Query<ArticlesQuery>,
) -> Result<HttpResponse, Error> {
  let mut filter = query.into_inner().into_filter()?;
  filter.published = Some(true);
  let listing = db::list_articles(&app_state.pool, &filter).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(ArticleListingDto::from(listing)))
}

// Admin listing exposes the full filter surface, drafts included.
pub async fn admin_articles(
  app_state: web::Data<AppState>,
  query: web::Query<ArticlesQuery>,
) -> Result<HttpResponse, Error> {
  let filter = query.into_inner().into_filter()?;
  let listing = db::list_articles(&app_state.pool, &filter).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(ArticleListingDto::from(listing)))
}

// Single fetch bumps the views counter. The read and the bump are
// two store calls, concurrent readers may under-count but the
// counter never goes backwards.
pub async fn article(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>,
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  match db::article_by_slug(&app_state.pool, &slug).map_err(map_db_error)? {
    Some(article) => {
      db::increment_article_views(&app_state.pool, article.id).map_err(map_db_error)?;
      Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
    }
    None => Err(Error::NotFound("Article does not exist".to_string())),
  }
}

pub async fn like_article(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  if !db::increment_article_likes(&app_state.pool, id).map_err(map_db_error)? {
    return Err(Error::NotFound("Article does not exist".to_string()));
  }
  let article = db::article_by_id(&app_state.pool, id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound("Article does not exist".to_string()))?;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

pub async fn create_article(
  app_state: web::Data<AppState>,
  form: web::Json<ArticleForm>,
) -> Result<HttpResponse, Error> {
  let (draft, explicit_slug) = form.into_inner().into_draft()?;
  let base = explicit_slug.unwrap_or_else(|| text_utils::slugify(&draft.title));
  // Best-effort pre-check. A racing create can still slip past
  // it, in which case the UNIQUE constraint turns the insert
  // into a conflict.
  let slug = db::unique_slug(&app_state.pool, SlugTable::Articles, &base, None)
    .map_err(map_db_error)?;
  let article =
    db::insert_article(&app_state.pool, &draft, &slug).map_err(map_db_error)?;
  Ok(HttpResponse::Created().json(ArticleDto::from(article)))
}

pub async fn update_article(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
  form: web::Json<ArticleForm>,
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  let (draft, explicit_slug) = form.into_inner().into_draft()?;
  let base = explicit_slug.unwrap_or_else(|| text_utils::slugify(&draft.title));
  // Excluding our own id keeps an unchanged title on its slug:
  let slug = db::unique_slug(&app_state.pool, SlugTable::Articles, &base, Some(id))
    .map_err(map_db_error)?;
  match db::update_article(&app_state.pool, id, &draft, &slug).map_err(map_db_error)? {
    Some(article) => Ok(HttpResponse::Ok().json(ArticleDto::from(article))),
    None => Err(Error::NotFound("Article does not exist".to_string())),
  }
}

pub async fn delete_article(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::article_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(article) => {
      db::delete_article(&app_state.pool, id).map_err(map_db_error)?;
      Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
    }
    None => Err(Error::NotFound("Article does not exist".to_string())),
  }
}

pub async fn delete_articles(
  app_state: web::Data<AppState>,
  form: web::Json<DeleteManyForm>,
) -> Result<HttpResponse, Error> {
  form.validate()?;
  let deleted_count =
    db::delete_articles(&app_state.pool, &form.ids).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(DeletedCountDto { deleted_count }))
}

/* --- Projects --- */

pub async fn projects(
  app_state: web::Data<AppState>,
  query: web::Query<ProjectsQuery>,
) -> Result<HttpResponse, Error> {
  let filter = query.into_inner().into_filter()?;
  let listing = db::list_projects(&app_state.pool, &filter).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(ProjectListingDto::from(listing)))
}

pub async fn project(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>,
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  match db::project_by_slug(&app_state.pool, &slug).map_err(map_db_error)? {
    Some(project) => {
      db::increment_project_views(&app_state.pool, project.id).map_err(map_db_error)?;
      Ok(HttpResponse::Ok().json(ProjectDto::from(project)))
    }
    None => Err(Error::NotFound("Project does not exist".to_string())),
  }
}

pub async fn like_project(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  if !db::increment_project_likes(&app_state.pool, id).map_err(map_db_error)? {
    return Err(Error::NotFound("Project does not exist".to_string()));
  }
  let project = db::project_by_id(&app_state.pool, id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound("Project does not exist".to_string()))?;
  Ok(HttpResponse::Ok().json(ProjectDto::from(project)))
}

pub async fn create_project(
  app_state: web::Data<AppState>,
  form: web::Json<ProjectForm>,
) -> Result<HttpResponse, Error> {
  let (draft, explicit_slug) = form.into_inner().into_draft()?;
  let base = explicit_slug.unwrap_or_else(|| text_utils::slugify(&draft.title));
  let slug = db::unique_slug(&app_state.pool, SlugTable::Projects, &base, None)
    .map_err(map_db_error)?;
  let project =
    db::insert_project(&app_state.pool, &draft, &slug).map_err(map_db_error)?;
  Ok(HttpResponse::Created().json(ProjectDto::from(project)))
}

pub async fn update_project(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
  form: web::Json<ProjectForm>,
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  let (draft, explicit_slug) = form.into_inner().into_draft()?;
  let base = explicit_slug.unwrap_or_else(|| text_utils::slugify(&draft.title));
  let slug = db::unique_slug(&app_state.pool, SlugTable::Projects, &base, Some(id))
    .map_err(map_db_error)?;
  match db::update_project(&app_state.pool, id, &draft, &slug).map_err(map_db_error)? {
    Some(project) => Ok(HttpResponse::Ok().json(ProjectDto::from(project))),
    None => Err(Error::NotFound("Project does not exist".to_string())),
  }
}

pub async fn delete_project(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::project_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(project) => {
      db::delete_project(&app_state.pool, id).map_err(map_db_error)?;
      Ok(HttpResponse::Ok().json(ProjectDto::from(project)))
    }
    None => Err(Error::NotFound("Project does not exist".to_string())),
  }
}

pub async fn delete_projects(
  app_state: web::Data<AppState>,
  form: web::Json<DeleteManyForm>,
) -> Result<HttpResponse, Error> {
  form.validate()?;
  let deleted_count =
    db::delete_projects(&app_state.pool, &form.ids).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(DeletedCountDto { deleted_count }))
}

/* --- Contact form --- */

pub async fn contact(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  form: web::Json<ContactForm>,
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  form.validate()?;

  let data = ContactEmailData::new(&form, &app_state.contact.site_name);
  let notification = hb
    .render("contact_notification", &data)
    .map_err(template_error)?;
  let reply = hb.render("contact_reply", &data).map_err(template_error)?;

  let mailer = app_state.mailer.clone();
  let recipient = app_state.contact.recipient.clone();
  let reply_to = form.email.trim().to_string();
  let subject = format!("New contact form submission: {}", form.subject);
  let reply_subject = format!(
    "Thanks for reaching out! - {}",
    app_state.contact.site_name
  );

  // SMTP can take seconds, keep it off the worker threads:
  web::block(move || {
    mailer.send_html(&recipient, &subject, notification)?;
    mailer.send_html(&reply_to, &reply_subject, reply)
  })
  .await
  .map_err(|e| {
    error!("Could not send contact emails - {:?}", e);
    Error::InternalServerError("Email sending failed".to_string())
  })?;

  Ok(HttpResponse::Ok().json(serde_json::json!({
    "success": true,
    "message": "Emails sent successfully"
  })))
}

fn template_error(e: handlebars::RenderError) -> Error {
  error!("A template engine error occurred while rendering an email: {}", e);
  Error::InternalServerError("Template engine error".to_string())
}
