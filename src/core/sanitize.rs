// src/core/sanitize.rs

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Lowercase, ASCII-alphanumeric words separated by single spaces.
/// "Add-Ons " → "add ons", "Chef's  Table" → "chef s table".
pub fn normalize_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut gap = false;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            if gap && !out.is_empty() { out.push(' '); }
            gap = false;
            out.extend(ch.to_lowercase());
        } else {
            gap = true;
        }
    }
    out
}

/// Drop a trailing item count such as "Entrees (12)" or "Sides [4]".
pub fn strip_count_suffix(s: &str) -> String {
    let t = s.trim_end();
    for (open, close) in [('(', ')'), ('[', ']')] {
        if let Some(inner) = t.strip_suffix(close) {
            if let Some(ix) = inner.rfind(open) {
                let body = &inner[ix + 1..];
                if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
                    return inner[..ix].trim_end().to_string();
                }
            }
        }
    }
    t.to_string()
}

/// First run of ASCII digits, e.g. the id in `getItemNutrition(4412, 'x')`.
pub fn first_digit_run(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let len = s[start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len() - start);
    Some(&s[start..start + len])
}

/// True when `keyword` (already normalized) appears in `normalized` as whole words,
/// allowing a plural "s"/"es" on the last word.
pub fn contains_keyword(normalized: &str, keyword: &str) -> bool {
    let kw = normalize_key(keyword);
    if kw.is_empty() { return false; }
    let hay = join!(" ", normalized, " ");
    [join!(" ", &kw, " "), join!(" ", &kw, "s "), join!(" ", &kw, "es ")]
        .iter()
        .any(|needle| hay.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_collapses_punctuation() {
        assert_eq!(normalize_key("  Add-Ons "), "add ons");
        assert_eq!(normalize_key("Chef's  Table"), "chef s table");
        assert_eq!(normalize_key("ENTRÉES"), "entrées");
        assert_eq!(normalize_key("--"), "");
    }

    #[test]
    fn strips_counts_only() {
        assert_eq!(strip_count_suffix("Entrees (12)"), "Entrees");
        assert_eq!(strip_count_suffix("Sides [4] "), "Sides");
        assert_eq!(strip_count_suffix("Soup (Vegan)"), "Soup (Vegan)");
        assert_eq!(strip_count_suffix("()"), "()");
    }

    #[test]
    fn digit_run_from_onclick() {
        assert_eq!(first_digit_run("getItemNutrition(4412, 'x')"), Some("4412"));
        assert_eq!(first_digit_run("12"), Some("12"));
        assert_eq!(first_digit_run("none"), None);
    }

    #[test]
    fn keyword_matching_is_word_based() {
        assert!(contains_keyword("chocolate chip cookies", "cookie"));
        assert!(contains_keyword("peach pie", "pie"));
        assert!(!contains_keyword("pierogi plate", "pie"));
        assert!(contains_keyword("chicken combo", "combo"));
        assert!(contains_keyword("steak with two sides", "with"));
        assert!(contains_keyword("strawberry ice cream", "ice cream"));
    }
}
