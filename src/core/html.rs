// src/core/html.rs
// Tolerant, case-insensitive HTML helpers for nutrition-panel fragments.

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Value of attribute `name` inside one opening tag (`<div class="a b" id=x>`).
/// Quoted and unquoted values are both accepted; lookup is case-insensitive.
pub fn attr_value(open_tag: &str, name: &str) -> Option<String> {
    let lc = open_tag.to_ascii_lowercase();
    let needle = to_lower(name);
    let mut from = 0usize;
    while let Some(rel) = lc[from..].find(&needle) {
        let at = from + rel;
        from = at + needle.len();
        let before_ok = at > 0 && lc.as_bytes()[at - 1].is_ascii_whitespace();
        let rest = lc[from..].trim_start();
        if !before_ok || !rest.starts_with('=') { continue; }

        let value_start = open_tag.len() - rest.len() + 1;
        let raw = open_tag[value_start..].trim_start();
        return Some(match raw.chars().next() {
            Some(q @ ('"' | '\'')) => raw[1..].split(q).next().unwrap_or("").to_string(),
            _ => raw
                .split(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                .next()
                .unwrap_or("")
                .to_string(),
        });
    }
    None
}

/// Inner HTML of the first element whose class list contains every class in `classes`.
/// Not nesting-aware: the element ends at the first matching close tag, which is
/// fine for the leaf `<div>`/`<span>` nodes this is used on.
pub fn inner_of_first_with_classes(html: &str, classes: &[String]) -> Option<String> {
    if classes.is_empty() { return None; }
    let lc = html.to_ascii_lowercase();
    let mut pos = 0usize;
    while let Some(rel) = lc[pos..].find('<') {
        let start = pos + rel;
        let name: String = html[start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        // a bare `<` in text is not a tag; keep looking right after it
        if name.is_empty() {
            pos = start + 1;
            continue;
        }
        let Some(gt) = html[start..].find('>') else { break };
        let open_end = start + gt + 1;
        pos = open_end;

        let open_tag = &html[start..open_end];
        let Some(class_attr) = attr_value(open_tag, "class") else { continue };
        let have: Vec<&str> = class_attr.split_whitespace().collect();
        let all = classes.iter().all(|want| have.iter().any(|h| h.eq_ignore_ascii_case(want)));
        if !all { continue; }

        let close = format!("</{}", name);
        let end = lc[open_end..].find(&close).map(|r| open_end + r).unwrap_or(html.len());
        return Some(html[open_end..end].to_string());
    }
    None
}
