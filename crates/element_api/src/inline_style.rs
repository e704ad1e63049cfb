/// `backgroundColor` -> `background-color`. Custom properties and names that
/// are already dashed pass through.
pub fn hyphenate(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Split a trailing `!important` off a value.
pub fn split_important(value: &str) -> (&str, bool) {
    let value = value.trim();
    match value.strip_suffix("!important") {
        Some(rest) => (rest.trim_end(), true),
        None => (value, false),
    }
}

/// Parse `a: b; c: d` into declarations, in order. Entries without a colon
/// or with an empty name or value are skipped.
pub fn parse_declarations(text: &str) -> Vec<(String, String, bool)> {
    let mut out = Vec::new();
    for decl in text.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let (value, important) = split_important(value);
        if name.is_empty() || value.is_empty() {
            continue;
        }
        out.push((name.to_string(), value.to_string(), important));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenates_camel_case() {
        assert_eq!(hyphenate("backgroundColor"), "background-color");
        assert_eq!(hyphenate("margin-top"), "margin-top");
        assert_eq!(hyphenate("--mainColor"), "--mainColor");
    }

    #[test]
    fn parses_declaration_lists() {
        let decls = parse_declarations(" color: red ;width:10px !important;;bogus; :x");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string(), false),
                ("width".to_string(), "10px".to_string(), true),
            ]
        );
    }
}
