mod app;
mod config;
mod db;
mod utils;

use color_eyre::Result;
use dotenv::dotenv;

#[actix_web::main]
async fn main() -> Result<()> {
  dotenv().ok();
  if std::env::var("RUST_LOG").is_err() {
    std::env::set_var("RUST_LOG", "info");
  }
  env_logger::init();

  app::run().await
}
