use lazy_static::lazy_static;
use regex::Regex;

// Slug and input sanitation helpers. The admin UI mostly sends
// clean data but slugs end up in URLs so we're strict here.

lazy_static! {
  // Any run of characters that can't appear in a slug becomes
  // a single hyphen.
  static ref NON_SLUG_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
  static ref HTTP_URL: Regex = Regex::new(r"^https?://\S+$").unwrap();
  // Not trying to fully validate emails, just to catch the
  // obviously broken ones before we hand them to the mailer.
  static ref EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Derive a URL-safe slug from a title: lowercase, runs of
/// anything that isn't [a-z0-9] collapsed to one hyphen,
/// leading and trailing hyphens trimmed.
/// Can return an empty string if the title was all punctuation,
/// callers have to deal with that case.
pub fn slugify(title: &str) -> String {
  let lowered = title.to_lowercase();
  NON_SLUG_RUN
    .replace_all(&lowered, "-")
    .trim_matches('-')
    .to_string()
}

/// Category slugs use a slightly different recipe than article or
/// project slugs: trim, lowercase, whitespace runs to hyphens, then
/// strip whatever isn't [a-z0-9-]. No uniqueness retry either, a
/// duplicate name simply hits the UNIQUE constraint.
pub fn category_slug(name: &str) -> String {
  name
    .trim()
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<&str>>()
    .join("-")
    .chars()
    .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
    .collect()
}

/// Escape LIKE wildcards in a user-provided search needle.
/// The queries using this add ESCAPE '\' to the LIKE clause.
pub fn escape_like(needle: &str) -> String {
  needle
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_")
}

pub fn is_http_url(value: &str) -> bool {
  HTTP_URL.is_match(value)
}

pub fn is_email(value: &str) -> bool {
  EMAIL.is_match(value)
}
