use actix_web::dev::RequestHead;
use actix_web::guard::Guard;
use actix_web::http::header;
use log::warn;

// Guards the whole /admin scope with HTTP Basic Auth against the
// single credential pair from the config. When the guard rejects,
// the fallback /admin scope registered right after the protected
// one answers with the 401 challenge (a guard itself can only
// make the route not match).
pub struct BasicAuthGuard {
  // "user:password", compared against the decoded header value.
  expected: String,
}

impl BasicAuthGuard {
  pub fn new(user: &str, password: &str) -> Self {
    Self {
      expected: format!("{}:{}", user, password),
    }
  }
}

impl Guard for BasicAuthGuard {
  fn check(&self, req: &RequestHead) -> bool {
    let header_value = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|h| h.to_str().ok());
    let encoded = match header_value.and_then(|h| h.strip_prefix("Basic ")) {
      Some(encoded) => encoded,
      None => return false,
    };
    let decoded = base64::decode(encoded)
      .ok()
      .and_then(|bytes| String::from_utf8(bytes).ok());
    match decoded {
      Some(credentials) if credentials == self.expected => true,
      _ => {
        warn!("Rejected admin credentials for {}", req.uri);
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  fn checks(guard: &BasicAuthGuard, auth: Option<&str>) -> bool {
    let req = match auth {
      Some(value) => TestRequest::default()
        .header("authorization", value)
        .to_http_request(),
      None => TestRequest::default().to_http_request(),
    };
    guard.check(req.head())
  }

  #[test]
  fn accepts_the_configured_credentials() {
    let guard = BasicAuthGuard::new("admin", "hunter2");
    // base64("admin:hunter2")
    assert!(checks(&guard, Some("Basic YWRtaW46aHVudGVyMg==")));
  }

  #[test]
  fn rejects_wrong_password() {
    let guard = BasicAuthGuard::new("admin", "hunter2");
    // base64("admin:wrong")
    assert!(!checks(&guard, Some("Basic YWRtaW46d3Jvbmc=")));
  }

  #[test]
  fn rejects_missing_or_malformed_headers() {
    let guard = BasicAuthGuard::new("admin", "hunter2");
    assert!(!checks(&guard, None));
    assert!(!checks(&guard, Some("Bearer token")));
    assert!(!checks(&guard, Some("Basic ???not-base64???")));
  }
}
