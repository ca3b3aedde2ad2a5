use color_eyre::Result;
use eyre::WrapErr;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Serialize;

use super::dtos::ContactForm;
use crate::config::Config;
use crate::utils::time_utils;

// Outbound SMTP for the contact form. The transport is cheap to
// clone so handlers can move a copy into web::block and keep the
// actix workers free while the mail goes out.

#[derive(Clone)]
pub struct Mailer {
  transport: SmtpTransport,
  from: Mailbox,
}

impl Mailer {
  pub fn from_config(config: &Config) -> Result<Self> {
    let mut builder = SmtpTransport::relay(&config.smtp_host)
      .context("SMTP relay setup")?
      .port(config.smtp_port);
    if !config.smtp_user.is_empty() {
      builder = builder.credentials(Credentials::new(
        config.smtp_user.clone(),
        config.smtp_password.clone(),
      ));
    }
    let from: Mailbox = config
      .contact_from
      .parse()
      .context("Parsing the contact sender address")?;
    Ok(Self {
      transport: builder.build(),
      from,
    })
  }

  pub fn send_html(&self, to: &str, subject: &str, html: String) -> Result<()> {
    let message = Message::builder()
      .from(self.from.clone())
      .to(to.parse().context("Parsing recipient address")?)
      .subject(subject)
      .header(ContentType::TEXT_HTML)
      .body(html)?;
    self.transport.send(&message)?;
    Ok(())
  }
}

/// Everything the two contact email templates can reference. The
/// message body is escaped here and rendered with a triple-stash
/// in the templates, so line breaks survive as <br>.
#[derive(Debug, Serialize)]
pub struct ContactEmailData {
  pub name: String,
  pub email: String,
  pub subject: String,
  pub message_html: String,
  pub submitted_at: String,
  pub site_name: String,
}

impl ContactEmailData {
  pub fn new(form: &ContactForm, site_name: &str) -> Self {
    let message_html =
      handlebars::html_escape(&form.message).replace('\n', "<br>");
    Self {
      name: form.name.clone(),
      email: form.email.clone(),
      subject: form.subject.clone(),
      message_html,
      submitted_at: time_utils::timestamp_to_rfc3339(time_utils::current_timestamp()),
      site_name: site_name.to_string(),
    }
  }
}
