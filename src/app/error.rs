use actix_web::{error::ResponseError, HttpResponse};
use derive_more::Display;
use log::error;
use rusqlite::ErrorCode;

// The messages for the 4xx kinds are meant for humans on the
// other end. Internal and database errors only show a generic
// line, the full cause goes to the logs in map_db_error.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "Conflict: {}", _0)]
  Conflict(String),
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Validation failed: {}", _0)]
  Validation(String),
}

impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) => {
        HttpResponse::InternalServerError().body(self.to_string())
      }
      Error::Conflict(_) => HttpResponse::Conflict().body(self.to_string()),
      Error::NotFound(_) => HttpResponse::NotFound().body(self.to_string()),
      Error::Validation(_) => HttpResponse::BadRequest().body(self.to_string()),
    }
  }
}

/// Translate store faults: a UNIQUE constraint violation (the
/// slug pre-check lost a race, or a duplicate category) becomes
/// a Conflict, everything else stays an opaque database error.
pub fn map_db_error(report: color_eyre::Report) -> Error {
  if let Some(rusqlite::Error::SqliteFailure(e, _)) = report.downcast_ref::<rusqlite::Error>()
  {
    if e.code == ErrorCode::ConstraintViolation {
      return Error::Conflict("That slug is already taken".to_string());
    }
  }
  error!("Database failure - {:?}", report);
  Error::DatabaseError(report.to_string())
}
