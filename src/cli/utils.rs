//! Shared CLI utilities.

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Printable name of a delimiter byte.
pub fn delimiter_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tab".to_string(),
        b' ' => "space".to_string(),
        other => format!("'{}'", other as char),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_csv_trims_and_drops_empty() {
        let parsed = parse_csv(&Some(" Cella613, ,Cella614,".to_string()));
        assert_eq!(parsed, Some(vec!["Cella613".to_string(), "Cella614".to_string()]));
        assert_eq!(parse_csv(&None), None);
    }

    #[test]
    fn delimiter_names() {
        assert_eq!(delimiter_name(b'\t'), "tab");
        assert_eq!(delimiter_name(b';'), "';'");
    }
}
