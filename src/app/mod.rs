use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use color_eyre::Result;
use eyre::WrapErr;
use handlebars::Handlebars;
use log::debug;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::{Config, ContactSettings};
use crate::db::{self, Pool};
use guards::BasicAuthGuard;
use mailer::Mailer;

mod dtos;
mod error;
mod guards;
mod handlers;
mod mailer;

// Shared state handed to every handler. The pool and the SMTP
// transport are both cheap clones around their actual resources.
pub struct AppState {
  pub pool: Pool,
  pub mailer: Mailer,
  pub contact: ContactSettings,
}

pub async fn run() -> Result<()> {
  let config = Config::from_env()
    .expect("Configuration (environment or .env file) is missing");
  debug!("Current config: {:?}", config);
  let manager = SqliteConnectionManager::file(&config.db_path);
  let pool = Pool::new(manager).expect("Database connection failed");
  db::init_schema(&pool)?;

  let mailer = Mailer::from_config(&config)
    .expect("Fatal: SMTP transport could not be set up");

  // The two contact email bodies are handlebars templates:
  let mut handlebars = Handlebars::new();
  handlebars
    .register_templates_directory(".xhtml", &config.template_dir)
    .expect("Fatal: templates directory might be missing or \
      not accessible");
  let handlebars_ref = web::Data::new(handlebars);

  // Cloned out before config moves into ContactSettings:
  let bind_address = config.bind_address.clone();
  let admin_user = config.admin_user.clone();
  let admin_password = config.admin_password.clone();

  let app_state = web::Data::new(AppState {
    pool,
    mailer,
    contact: config.into(),
  });

  HttpServer::new(move || {
    App::new()
      .app_data(app_state.clone())
      .app_data(handlebars_ref.clone())
      .app_data(web::PathConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid path arguments")
      }))
      .app_data(web::QueryConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid query string arguments")
      }))
      .app_data(web::JsonConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid JSON body")
      }))
      .wrap(middleware::Logger::default())
      // The frontend lives on its own origin:
      .wrap(Cors::permissive())
      .configure(public_endpoints_config)
      .service(admin_endpoints(&admin_user, &admin_password))
      // Same prefix, registered after the guarded scope: requests
      // with missing or wrong credentials fall through to here and
      // get the basic auth challenge.
      .service(
        web::scope("/admin")
          .default_service(web::route().to(handlers::auth_required)),
      )
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

// Route configuration:
fn public_endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/", web::get().to(handlers::index))
    .route("/categories", web::get().to(handlers::categories))
    .route("/articles", web::get().to(handlers::articles))
    .route("/articles/{slug}", web::get().to(handlers::article))
    .route("/articles/{id}/like", web::post().to(handlers::like_article))
    .route("/projects", web::get().to(handlers::projects))
    .route("/projects/{slug}", web::get().to(handlers::project))
    .route("/projects/{id}/like", web::post().to(handlers::like_project))
    .route("/contact", web::post().to(handlers::contact));
}

fn admin_endpoints(user: &str, password: &str) -> actix_web::Scope {
  web::scope("/admin")
    .guard(BasicAuthGuard::new(user, password))
    .route("/articles", web::get().to(handlers::admin_articles))
    .route("/articles", web::post().to(handlers::create_article))
    // Registered before the {id} routes so it matches first:
    .route(
      "/articles/delete-many",
      web::post().to(handlers::delete_articles),
    )
    .route("/articles/{id}", web::put().to(handlers::update_article))
    .route("/articles/{id}", web::delete().to(handlers::delete_article))
    // Projects have no draft state so the admin listing is the
    // same handler as the public one:
    .route("/projects", web::get().to(handlers::projects))
    .route("/projects", web::post().to(handlers::create_project))
    .route(
      "/projects/delete-many",
      web::post().to(handlers::delete_projects),
    )
    .route("/projects/{id}", web::put().to(handlers::update_project))
    .route("/projects/{id}", web::delete().to(handlers::delete_project))
    .route("/categories", web::post().to(handlers::create_category))
}
