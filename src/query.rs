use url::form_urlencoded;

/// Splits `page.html?name=value&...` (or just `name=value&...`) into decoded
/// filter name/value pairs, in order.
pub fn parse_query(input: &str) -> Vec<(String, String)> {
    let input = input.trim().trim_end_matches('#');
    let query = match input.find('?') {
        Some(pos) => &input[pos + 1..],
        None if input.contains('=') => input,
        None => return Vec::new(),
    };
    form_urlencoded::parse(query.as_bytes())
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_url() {
        let pairs = parse_query("stable-hcl.html?manufacturer=Eaton&connection=USB#");
        assert_eq!(
            pairs,
            vec![
                ("manufacturer".to_string(), "Eaton".to_string()),
                ("connection".to_string(), "USB".to_string()),
            ]
        );
    }

    #[test]
    fn decodes_values() {
        let pairs = parse_query("manufacturer=American%20Power+Conversion&support-level=5");
        assert_eq!(pairs[0].1, "American Power Conversion");
        assert_eq!(pairs[1], ("support-level".to_string(), "5".to_string()));
    }

    #[test]
    fn no_query_yields_nothing() {
        assert!(parse_query("stable-hcl.html").is_empty());
        assert!(parse_query("stable-hcl.html?").is_empty());
        assert!(parse_query("").is_empty());
    }
}
