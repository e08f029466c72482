// src/core/vischars.rs
// Visible-text character iterator over an HTML fragment.
// Tags (<...>) become a single separating space, <script>/<style> bodies are dropped,
// common entities are decoded, and runs of whitespace collapse to one ' '.

pub struct VisChars<'a> {
    s: &'a str,
    b: &'a [u8],
    i: usize,
    n: usize,
    /// Last emitted char was a space (or nothing emitted yet).
    spaced: bool,
}

impl<'a> VisChars<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, b: s.as_bytes(), i: 0, n: s.len(), spaced: true }
    }

    /// Returns the lowercase tag name starting at `self.i` (which points at '<').
    fn tag_name(&self) -> &'a str {
        let start = self.i + 1;
        let mut end = start;
        while end < self.n && self.b[end].is_ascii_alphanumeric() { end += 1; }
        &self.s[start..end]
    }

    #[inline]
    fn skip_tag(&mut self) {
        // called when current byte is '<'
        self.i += 1;
        let mut in_s = false; // '
        let mut in_d = false; // "
        while self.i < self.n {
            match self.b[self.i] {
                b'\'' if !in_d => in_s = !in_s,
                b'"'  if !in_s => in_d = !in_d,
                b'>' if !in_s && !in_d => { self.i += 1; break; }
                _ => {}
            }
            self.i += 1;
        }
    }

    /// Skip a raw-text element body up to and including its closing tag.
    fn skip_raw_body(&mut self, name: &str) {
        let close = format!("</{}", name);
        let rest = &self.s[self.i..];
        let lc = rest.to_ascii_lowercase();
        match lc.find(&close) {
            Some(rel) => {
                self.i += rel;
                self.skip_tag();
            }
            None => self.i = self.n,
        }
    }

    /// Decode the entity at `self.i` (which points at '&').
    fn entity(&mut self) -> char {
        let start = self.i + 1;
        let mut end = start;
        while end < self.n && end - start < 10 && (self.b[end].is_ascii_alphanumeric() || self.b[end] == b'#') {
            end += 1;
        }
        if end >= self.n || self.b[end] != b';' {
            // bare ampersand
            self.i += 1;
            return '&';
        }
        let name = &self.s[start..end];
        self.i = end + 1;
        match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" | "#39" => '\'',
            _ => ' ', // &nbsp; &#160; and anything we don't care about
        }
    }

    #[inline]
    fn next_char(&mut self) -> Option<char> {
        if self.i >= self.n { return None; }
        let c = self.b[self.i];
        if c < 0x80 { self.i += 1; Some(c as char) }
        else {
            let ch = self.s[self.i..].chars().next()?;
            self.i += ch.len_utf8();
            Some(ch)
        }
    }

    fn emit(&mut self, ch: char) -> Option<char> {
        if ch.is_whitespace() {
            if self.spaced { return None; }
            self.spaced = true;
            return Some(' ');
        }
        self.spaced = false;
        Some(ch)
    }
}

impl<'a> Iterator for VisChars<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while self.i < self.n {
            let raw = match self.b[self.i] {
                b'<' => {
                    let name = self.tag_name().to_ascii_lowercase();
                    self.skip_tag();
                    if name == "script" || name == "style" { self.skip_raw_body(&name); }
                    ' '
                }
                b'&' => self.entity(),
                _ => self.next_char()?,
            };
            if let Some(out) = self.emit(raw) { return Some(out); }
        }
        None
    }
}

/// Visible text of an HTML fragment, trimmed.
pub fn visible_text(html: &str) -> String {
    let out: String = VisChars::new(html).collect();
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_separate_words() {
        let html = r#"<span>Trans Fat&nbsp;0g</span><span class="bold-text">Cholesterol</span>"#;
        assert_eq!(visible_text(html), "Trans Fat 0g Cholesterol");
    }

    #[test]
    fn scripts_and_styles_are_dropped() {
        let html = "<style>.a{color:red}</style><p>Iron</p><script>var x = '<b>';</script> 2mg";
        assert_eq!(visible_text(html), "Iron 2mg");
    }

    #[test]
    fn entities_decode() {
        assert_eq!(visible_text("Mac &amp; Cheese"), "Mac & Cheese");
        assert_eq!(visible_text("Salt & Pepper"), "Salt & Pepper");
        assert_eq!(visible_text("Chef&#39;s Table"), "Chef's Table");
    }
}
