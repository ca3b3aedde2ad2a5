// Small query assembly helpers shared by the db functions.

/// Generate a comma-separated list of positional placeholders
/// for an IN (...) clause.
pub fn in_placeholders(count: usize) -> String {
  let mut placeholders: Vec<&str> = Vec::with_capacity(count);
  for _ in 0..count {
    placeholders.push("?");
  }
  placeholders.join(",")
}

/// Stitch WHERE clauses together with AND. Empty input gives an
/// empty string so the fragment can always be spliced in.
pub fn where_clause(clauses: &[String]) -> String {
  if clauses.is_empty() {
    String::new()
  } else {
    format!("WHERE {} ", clauses.join(" AND "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generates_placeholder_lists() {
    assert_eq!(in_placeholders(0), "");
    assert_eq!(in_placeholders(1), "?");
    assert_eq!(in_placeholders(4), "?,?,?,?");
  }

  #[test]
  fn empty_clause_list_gives_empty_where() {
    assert_eq!(where_clause(&[]), "");
  }

  #[test]
  fn clauses_are_joined_with_and() {
    let clauses = vec!["a = ?".to_string(), "b = ?".to_string()];
    assert_eq!(where_clause(&clauses), "WHERE a = ? AND b = ? ");
  }
}
