// Adding the context method to errors:
use color_eyre::Result;
use eyre::WrapErr;
use serde::Deserialize;
use std::convert::From;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  pub template_dir: String,
  // The single admin credential pair for the basic auth gate:
  pub admin_user: String,
  pub admin_password: String,
  // Outbound SMTP for the contact form:
  pub smtp_host: String,
  pub smtp_port: u16,
  pub smtp_user: String,
  pub smtp_password: String,
  // Where contact form submissions end up, and the sender
  // address on both outgoing emails:
  pub contact_recipient: String,
  pub contact_from: String,
  pub site_name: String,
}

// The part of the config that handlers need at request time.
// Smaller than dragging the whole Config (and the credentials in
// it) into the app state.
#[derive(Debug, Clone)]
pub struct ContactSettings {
  pub recipient: String,
  pub site_name: String,
}

impl From<Config> for ContactSettings {
  fn from(config: Config) -> Self {
    Self {
      recipient: config.contact_recipient,
      site_name: config.site_name,
    }
  }
}

impl Config {
  pub fn from_env() -> Result<Config> {
    let mut c = config::Config::new();
    // Defaults for everything that has a sane one. Keys have to
    // be lowercase compared to what's in the .env file.
    c.set_default("bind_address", "127.0.0.1:8080")?;
    c.set_default("template_dir", "./templates")?;
    c.set_default("smtp_host", "localhost")?;
    c.set_default("smtp_port", 587)?;
    c.set_default("smtp_user", "")?;
    c.set_default("smtp_password", "")?;
    c.set_default("site_name", "Portfolio")?;
    // db_path, admin_user, admin_password, contact_recipient and
    // contact_from have no defaults on purpose, missing values
    // should fail loudly at startup.
    c.merge(config::Environment::default())?;
    // The error has to be given a context for
    // color_eyre to work here:
    c.try_into()
      .context("Loading configuration from env")
  }
}
