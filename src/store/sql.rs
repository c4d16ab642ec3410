//! SQL text for the target table.

use super::WriteMode;

/// Positional parameter style of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `$1`, `$2`, ...
    Dollar,
    /// `?1`, `?2`, ...
    Question,
}

impl Placeholder {
    fn nth(self, n: usize) -> String {
        match self {
            Placeholder::Dollar => format!("${}", n),
            Placeholder::Question => format!("?{}", n),
        }
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema))
}

/// `qualified` must already be quoted.
pub fn create_table(qualified: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
    cella TEXT NOT NULL,
    stats_date DATE NOT NULL,
    partial_count INTEGER,
    full_count INTEGER,
    forecast_expected NUMERIC(18,2),
    PRIMARY KEY (cella, stats_date)
)",
        qualified
    )
}

pub fn delete_all(qualified: &str) -> String {
    format!("DELETE FROM {}", qualified)
}

pub fn insert(qualified: &str, mode: WriteMode, style: Placeholder) -> String {
    let values: Vec<String> = (1..=5).map(|n| style.nth(n)).collect();
    let mut sql = format!(
        "INSERT INTO {} (cella, stats_date, partial_count, full_count, forecast_expected) VALUES ({})",
        qualified,
        values.join(", ")
    );
    if mode == WriteMode::Upsert {
        sql.push_str(
            " ON CONFLICT (cella, stats_date) DO UPDATE SET \
             partial_count = EXCLUDED.partial_count, \
             full_count = EXCLUDED.full_count, \
             forecast_expected = EXCLUDED.forecast_expected",
        );
    }
    sql
}
