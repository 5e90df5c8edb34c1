//! Production-log extraction from a SQL dump file.
//!
//! The dump is not run through a SQL parser. A pattern match locates every
//! `INSERT INTO production_logs ... VALUES ...;` statement (case- and
//! whitespace-tolerant, across lines) and each parenthesized value tuple is
//! fed to a strict literal grammar that accepts only quoted strings, integer
//! and float numbers, and NULL. Anything else is a [`PipelineError::Parse`]
//! and fails the whole run; nothing in the dump is ever evaluated as code.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use regex::RegexBuilder;

use crate::error::{PipelineError, Result};
use crate::models::ProductionRecord;

// ---

/// Load all production records from the dump at `path`.
///
/// Fails with [`PipelineError::InputNotFound`] when the path does not exist
/// and with [`PipelineError::Parse`] on the first malformed tuple.
pub fn load_production_dump(path: &Path) -> Result<Vec<ProductionRecord>> {
    // ---
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }

    let sql_text = fs::read_to_string(path)?;
    let records = parse_dump(&sql_text)?;

    tracing::info!(
        "Parsed {} production records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Extract production records from raw dump text.
pub fn parse_dump(sql_text: &str) -> Result<Vec<ProductionRecord>> {
    // ---
    let statement_re = RegexBuilder::new(
        r"INSERT\s+INTO\s+production_logs\s*\(.*?\)\s*VALUES\s*(.*?);",
    )
    .case_insensitive(true)
    .dot_matches_new_line(true)
    .build()
    .expect("statement regex is a valid pattern");

    let tuple_re = RegexBuilder::new(r"\(([^()]*)\)")
        .build()
        .expect("tuple regex is a valid pattern");

    let mut records = Vec::new();
    for statement in statement_re.captures_iter(sql_text) {
        for tuple in tuple_re.captures_iter(&statement[1]) {
            records.push(parse_tuple(&tuple[1])?);
        }
    }

    Ok(records)
}

// ---

/// One literal token inside a value tuple.
#[derive(Debug, PartialEq)]
enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Null,
}

impl Literal {
    fn type_name(&self) -> &'static str {
        // ---
        match self {
            Literal::Str(_) => "string",
            Literal::Int(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Null => "NULL",
        }
    }
}

/// Parse one 5-field tuple body into a production record.
///
/// Column order is fixed: (date, mine_id, shift, tons_extracted, quality_grade).
fn parse_tuple(body: &str) -> Result<ProductionRecord> {
    // ---
    let fields = split_fields(body);
    if fields.len() != 5 {
        return Err(PipelineError::Parse(format!(
            "expected 5 values per tuple, found {} in ({})",
            fields.len(),
            body.trim()
        )));
    }

    let mut literals = Vec::with_capacity(5);
    for field in &fields {
        literals.push(parse_literal(field)?);
    }

    let date = match &literals[0] {
        Literal::Str(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
            PipelineError::Parse(format!("bad date literal '{s}': {e}"))
        })?,
        other => {
            return Err(PipelineError::Parse(format!(
                "date column must be a quoted string, found {}",
                other.type_name()
            )))
        }
    };

    let mine_id = match literals[1] {
        Literal::Int(n) => u32::try_from(n).map_err(|_| {
            PipelineError::Parse(format!("mine_id {n} out of range"))
        })?,
        ref other => {
            return Err(PipelineError::Parse(format!(
                "mine_id column must be an integer, found {}",
                other.type_name()
            )))
        }
    };

    let shift = match &literals[2] {
        Literal::Str(s) => s.clone(),
        other => {
            return Err(PipelineError::Parse(format!(
                "shift column must be a quoted string, found {}",
                other.type_name()
            )))
        }
    };

    let tons_extracted = numeric_column(&literals[3], "tons_extracted")?;
    let quality_grade = numeric_column(&literals[4], "quality_grade")?;

    Ok(ProductionRecord {
        date,
        mine_id,
        shift,
        tons_extracted,
        quality_grade,
    })
}

fn numeric_column(literal: &Literal, column: &str) -> Result<f64> {
    // ---
    match literal {
        Literal::Int(n) => Ok(*n as f64),
        Literal::Float(f) => Ok(*f),
        other => Err(PipelineError::Parse(format!(
            "{column} column must be numeric, found {}",
            other.type_name()
        ))),
    }
}

/// Split a tuple body on top-level commas, respecting quoted strings.
fn split_fields(body: &str) -> Vec<String> {
    // ---
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                // SQL escapes a quote by doubling it
                if chars.peek() == Some(&q) {
                    chars.next();
                    current.push(c);
                    current.push(c);
                } else {
                    quote = None;
                    current.push(c);
                }
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ',' => {
                fields.push(std::mem::take(&mut current));
            }
            None => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Parse a single trimmed field into a [`Literal`].
///
/// This is the strict grammar: quoted string, integer, float, or NULL.
fn parse_literal(raw: &str) -> Result<Literal> {
    // ---
    let token = raw.trim();

    if token.eq_ignore_ascii_case("null") {
        return Ok(Literal::Null);
    }

    if let Some(q) = token.chars().next().filter(|c| *c == '\'' || *c == '"') {
        let inner = &token[1..];
        if inner.is_empty() || !inner.ends_with(q) {
            return Err(PipelineError::Parse(format!(
                "unterminated string literal: {token}"
            )));
        }
        let body = &inner[..inner.len() - 1];
        return Ok(Literal::Str(body.replace(&format!("{q}{q}"), &q.to_string())));
    }

    if let Ok(n) = token.parse::<i64>() {
        return Ok(Literal::Int(n));
    }
    if let Ok(f) = token.parse::<f64>() {
        return Ok(Literal::Float(f));
    }

    Err(PipelineError::Parse(format!(
        "unsupported literal `{token}` (expected string, number, or NULL)"
    )))
}

#[cfg(test)]
mod tests {
    // ---
    use std::io::Write;

    use super::*;

    const DUMP: &str = r#"
        INSERT INTO production_logs (date, mine_id, shift, tons_extracted, quality_grade)
        VALUES
            ('2025-05-12', 1, 'A', 100, 3.5),
            ('2025-05-12', 1, 'B', 50, 4.0);
        insert into production_logs (date, mine_id, shift, tons_extracted, quality_grade)
        values ('2025-05-13', 2, 'A', -20.5, 2.8);
    "#;

    #[test]
    fn test_parses_all_tuples_across_statements() {
        // ---
        let records = parse_dump(DUMP).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 5, 12).unwrap());
        assert_eq!(records[0].mine_id, 1);
        assert_eq!(records[0].shift, "A");
        assert_eq!(records[0].tons_extracted, 100.0);
        assert_eq!(records[0].quality_grade, 3.5);

        // Lowercase statement, second mine, negative tonnage preserved as-is
        assert_eq!(records[2].mine_id, 2);
        assert_eq!(records[2].tons_extracted, -20.5);
    }

    #[test]
    fn test_quoted_comma_and_escaped_quote() {
        // ---
        let dump = "INSERT INTO production_logs (c) VALUES \
                    ('2025-05-12', 3, 'night, late ''crew''', 10, 1.0);";
        let records = parse_dump(dump).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].shift, "night, late 'crew'");
    }

    #[test]
    fn test_other_tables_are_ignored() {
        // ---
        let dump = "INSERT INTO equipment (id) VALUES (1), (2);";
        assert!(parse_dump(dump).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_literal_is_fatal() {
        // ---
        let dump =
            "INSERT INTO production_logs (c) VALUES ('2025-05-12', 1, 'A', DROP TABLE, 3.5);";
        let err = parse_dump(dump).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_wrong_arity_is_fatal() {
        // ---
        let dump = "INSERT INTO production_logs (c) VALUES ('2025-05-12', 1, 'A', 10);";
        assert!(matches!(
            parse_dump(dump).unwrap_err(),
            PipelineError::Parse(_)
        ));
    }

    #[test]
    fn test_bad_date_and_null_tonnage_rejected() {
        // ---
        let bad_date = "INSERT INTO production_logs (c) VALUES ('12-05-2025', 1, 'A', 10, 1.0);";
        assert!(matches!(
            parse_dump(bad_date).unwrap_err(),
            PipelineError::Parse(_)
        ));

        let null_tons = "INSERT INTO production_logs (c) VALUES ('2025-05-12', 1, 'A', NULL, 1.0);";
        assert!(matches!(
            parse_dump(null_tons).unwrap_err(),
            PipelineError::Parse(_)
        ));
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        // ---
        let err = load_production_dump(Path::new("/no/such/dump.sql")).unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        // ---
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{DUMP}").unwrap();

        let records = load_production_dump(file.path()).unwrap();
        assert_eq!(records.len(), 3);
    }
}
