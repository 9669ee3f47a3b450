// Minimal HTML reader/writer for editor content.
// Covers the tag vocabulary the editor itself produces; anything else is
// unwrapped, and tags forbidden by the sanitize policy are dropped whole.

use crate::document::{
    Attrs, Block, BlockType, Document, InlineContent, SanitizePolicy, TextRun, TextStyle,
};

/// Serialize a document to markup. The output is canonical: reading it back
/// and writing it again produces identical bytes.
pub fn write(doc: &Document) -> String {
    let mut out = String::new();
    let blocks = doc.blocks();
    let mut i = 0;
    while i < blocks.len() {
        if matches!(blocks[i].block_type, BlockType::ListItem { .. }) {
            let run_end = blocks[i..]
                .iter()
                .position(|b| !matches!(b.block_type, BlockType::ListItem { .. }))
                .map(|n| i + n)
                .unwrap_or(blocks.len());
            write_list(&blocks[i..run_end], &mut out);
            i = run_end;
            continue;
        }
        write_block(&blocks[i], &mut out);
        i += 1;
    }
    out
}

fn write_block(block: &Block, out: &mut String) {
    match block.block_type {
        BlockType::HorizontalRule => out.push_str("<hr>"),
        BlockType::Blockquote { depth } => {
            for _ in 0..depth {
                out.push_str("<blockquote>");
            }
            write_inline(&block.content, out);
            for _ in 0..depth {
                out.push_str("</blockquote>");
            }
        }
        _ => {
            let tag = block.block_type.tag();
            out.push('<');
            out.push_str(tag);
            write_attrs(&block.attrs, out);
            out.push('>');
            write_inline(&block.content, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Render a run of consecutive list items, nesting list wrappers by indent.
fn write_list(items: &[Block], out: &mut String) {
    let mut open: Vec<bool> = Vec::new();
    for item in items {
        let BlockType::ListItem { ordered, indent } = item.block_type else {
            continue;
        };
        let depth = indent as usize + 1;
        while open.len() > depth {
            close_list(&mut open, out);
        }
        if open.len() == depth && open.last() != Some(&ordered) {
            close_list(&mut open, out);
        }
        while open.len() < depth {
            out.push_str(if ordered { "<ol>" } else { "<ul>" });
            open.push(ordered);
        }
        out.push_str("<li");
        write_attrs(&item.attrs, out);
        out.push('>');
        write_inline(&item.content, out);
        out.push_str("</li>");
    }
    while !open.is_empty() {
        close_list(&mut open, out);
    }
}

fn close_list(open: &mut Vec<bool>, out: &mut String) {
    if let Some(ordered) = open.pop() {
        out.push_str(if ordered { "</ol>" } else { "</ul>" });
    }
}

fn write_inline(content: &[InlineContent], out: &mut String) {
    for item in content {
        match item {
            InlineContent::Text(run) => write_run(run, out),
            InlineContent::Link {
                href,
                attrs,
                content,
            } => {
                out.push_str("<a href=\"");
                escape_attr(href, out);
                out.push('"');
                write_attrs(attrs, out);
                out.push('>');
                write_inline(content, out);
                out.push_str("</a>");
            }
            InlineContent::Image { src, attrs } => {
                out.push_str("<img src=\"");
                escape_attr(src, out);
                out.push('"');
                write_attrs(attrs, out);
                out.push('>');
            }
        }
    }
}

fn write_run(run: &TextRun, out: &mut String) {
    let mut open: Vec<&str> = Vec::new();
    if run.style.bold {
        open.push("b");
    }
    if run.style.italic {
        open.push("i");
    }
    if run.style.underline {
        open.push("u");
    }
    if run.style.code {
        open.push("code");
    }
    for tag in &open {
        out.push('<');
        out.push_str(tag);
        out.push('>');
    }
    escape_text(&run.text, out);
    for tag in open.iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn write_attrs(attrs: &Attrs, out: &mut String) {
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
}

/// Escape text for inclusion in markup.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_text(text, &mut out);
    out
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Read markup into a document, applying the sanitize policy as it goes:
/// forbidden tags are dropped with their content, forbidden attributes never
/// make it into the model.
pub fn read(input: &str, policy: &SanitizePolicy) -> Document {
    let mut builder = Builder::new(policy);
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        if lt > 0 {
            builder.text(&rest[..lt]);
        }
        rest = &rest[lt..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            continue;
        }

        let Some(gt) = rest.find('>') else {
            // Unterminated tag; treat the remainder as text.
            builder.text(rest);
            rest = "";
            break;
        };
        let tag_src = &rest[1..gt];
        rest = &rest[gt + 1..];

        if let Some(name) = tag_src.strip_prefix('/') {
            builder.close(name.trim().to_ascii_lowercase().as_str());
        } else {
            let (name, attrs) = parse_tag(tag_src);
            rest = builder.open(&name, attrs, rest);
        }
    }
    if !rest.is_empty() {
        builder.text(rest);
    }
    builder.finish()
}

/// Split a tag body into its lowercase name and attribute list.
fn parse_tag(src: &str) -> (String, Attrs) {
    let src = src.trim_end_matches('/').trim();
    let name_end = src
        .find(|c: char| c.is_whitespace())
        .unwrap_or(src.len());
    let name = src[..name_end].to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut rest = src[name_end..].trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();
        if key.is_empty() {
            break;
        }
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = if let Some(stripped) = after_eq.strip_prefix('"') {
                match stripped.find('"') {
                    Some(end) => (stripped[..end].to_string(), &stripped[end + 1..]),
                    None => (stripped.to_string(), ""),
                }
            } else if let Some(stripped) = after_eq.strip_prefix('\'') {
                match stripped.find('\'') {
                    Some(end) => (stripped[..end].to_string(), &stripped[end + 1..]),
                    None => (stripped.to_string(), ""),
                }
            } else {
                let end = after_eq
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(after_eq.len());
                (after_eq[..end].to_string(), &after_eq[end..])
            };
            attrs.push((key, decode_entities(&value)));
            rest = remaining.trim_start();
        } else {
            attrs.push((key, String::new()));
        }
    }

    (name, attrs)
}

struct Builder<'p> {
    policy: &'p SanitizePolicy,
    doc: Document,
    current: Option<Block>,
    // Innermost sink receives text; entering a link pushes a new one.
    sinks: Vec<Vec<InlineContent>>,
    links: Vec<(String, Attrs)>,
    styles: Vec<TextStyle>,
    quote_depth: u8,
    lists: Vec<bool>,
}

impl<'p> Builder<'p> {
    fn new(policy: &'p SanitizePolicy) -> Self {
        Builder {
            policy,
            doc: Document::new(),
            current: None,
            sinks: vec![Vec::new()],
            links: Vec::new(),
            styles: vec![TextStyle::plain()],
            quote_depth: 0,
            lists: Vec::new(),
        }
    }

    fn style(&self) -> TextStyle {
        *self.styles.last().unwrap_or(&TextStyle::plain())
    }

    fn filtered(&self, attrs: Attrs) -> Attrs {
        attrs
            .into_iter()
            .filter(|(name, _)| !self.policy.forbids_attr(name))
            .collect()
    }

    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        let keep_space = matches!(
            self.current.as_ref().map(|b| b.block_type),
            Some(BlockType::Preformatted)
        );
        if !keep_space && decoded.trim().is_empty() {
            return;
        }
        if self.current.is_none() {
            self.begin_block(self.implicit_block_type(), Vec::new());
        }
        let style = self.style();
        if let Some(sink) = self.sinks.last_mut() {
            sink.push(InlineContent::Text(TextRun::new(decoded, style)));
        }
    }

    /// Block type for text that appears outside any explicit block tag.
    fn implicit_block_type(&self) -> BlockType {
        if let Some(&ordered) = self.lists.last() {
            BlockType::ListItem {
                ordered,
                indent: (self.lists.len() - 1) as u8,
            }
        } else if self.quote_depth > 0 {
            BlockType::Blockquote {
                depth: self.quote_depth,
            }
        } else {
            BlockType::Paragraph
        }
    }

    fn begin_block(&mut self, block_type: BlockType, attrs: Attrs) {
        self.end_block();
        self.current = Some(Block {
            block_type,
            attrs,
            content: Vec::new(),
        });
    }

    fn end_block(&mut self) {
        // Collapse any unclosed inline scopes into the block; styles must not
        // leak into the next one either.
        while self.sinks.len() > 1 {
            self.close("a");
        }
        self.styles.truncate(1);
        if let Some(mut block) = self.current.take() {
            block.content = self.sinks.pop().unwrap_or_default();
            self.sinks.push(Vec::new());
            self.doc.add_block(block);
        } else if let Some(sink) = self.sinks.last_mut() {
            sink.clear();
        }
    }

    /// Handle an opening tag; returns the remaining input (forbidden elements
    /// swallow everything up to their matching close).
    fn open<'a>(&mut self, name: &str, attrs: Attrs, rest: &'a str) -> &'a str {
        if self.policy.forbids_tag(name) {
            // Void elements have no close tag to scan for.
            if matches!(name, "img" | "hr" | "br") {
                return rest;
            }
            return skip_element(name, rest);
        }
        let attrs = self.filtered(attrs);
        match name {
            "p" | "div" => {
                let block_type = if self.quote_depth > 0 {
                    BlockType::Blockquote {
                        depth: self.quote_depth,
                    }
                } else {
                    BlockType::Paragraph
                };
                self.begin_block(block_type, attrs);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse().unwrap_or(6);
                self.begin_block(BlockType::Heading { level }, attrs);
            }
            "pre" => self.begin_block(BlockType::Preformatted, attrs),
            "blockquote" => {
                self.end_block();
                self.quote_depth = self.quote_depth.saturating_add(1);
            }
            "ul" | "ol" => {
                self.end_block();
                self.lists.push(name == "ol");
            }
            "li" => {
                let ordered = *self.lists.last().unwrap_or(&false);
                let indent = self.lists.len().saturating_sub(1) as u8;
                self.begin_block(BlockType::ListItem { ordered, indent }, attrs);
            }
            "hr" => {
                self.end_block();
                self.doc.add_block(Block::new(BlockType::HorizontalRule));
            }
            "img" => {
                let src = attrs
                    .iter()
                    .find(|(k, _)| k == "src")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                let attrs = attrs.into_iter().filter(|(k, _)| k != "src").collect();
                if self.current.is_none() {
                    self.begin_block(self.implicit_block_type(), Vec::new());
                }
                if let Some(sink) = self.sinks.last_mut() {
                    sink.push(InlineContent::Image { src, attrs });
                }
            }
            "a" => {
                let href = attrs
                    .iter()
                    .find(|(k, _)| k == "href")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                let attrs = attrs.into_iter().filter(|(k, _)| k != "href").collect();
                if self.current.is_none() {
                    self.begin_block(self.implicit_block_type(), Vec::new());
                }
                self.links.push((href, attrs));
                self.sinks.push(Vec::new());
            }
            "b" | "strong" => self.push_style(|s| s.bold = true),
            "i" | "em" => self.push_style(|s| s.italic = true),
            "u" => self.push_style(|s| s.underline = true),
            "code" => self.push_style(|s| s.code = true),
            "br" => {}
            _ => {} // unknown tags are unwrapped
        }
        rest
    }

    fn push_style<F: FnOnce(&mut TextStyle)>(&mut self, f: F) {
        let mut style = self.style();
        f(&mut style);
        self.styles.push(style);
    }

    fn close(&mut self, name: &str) {
        match name {
            "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "pre" | "li" => {
                self.end_block()
            }
            "blockquote" => {
                self.end_block();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            "ul" | "ol" => {
                self.end_block();
                self.lists.pop();
            }
            "a" => {
                if let (Some(content), Some((href, attrs))) = (self.sinks.pop(), self.links.pop()) {
                    if let Some(sink) = self.sinks.last_mut() {
                        sink.push(InlineContent::Link {
                            href,
                            attrs,
                            content,
                        });
                    }
                }
            }
            "b" | "strong" | "i" | "em" | "u" | "code" => {
                if self.styles.len() > 1 {
                    self.styles.pop();
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Document {
        self.end_block();
        self.doc
    }
}

/// Skip everything up to the matching close of a forbidden element,
/// honouring nesting of the same tag name.
fn skip_element<'a>(name: &str, mut rest: &'a str) -> &'a str {
    let mut depth = 1;
    while depth > 0 {
        let Some(lt) = rest.find('<') else {
            return "";
        };
        rest = &rest[lt..];
        let Some(gt) = rest.find('>') else {
            return "";
        };
        let body = rest[1..gt].trim();
        if let Some(closer) = body.strip_prefix('/') {
            if closer.trim().eq_ignore_ascii_case(name) {
                depth -= 1;
            }
        } else {
            let tag_name = body
                .split(|c: char| c.is_whitespace())
                .next()
                .unwrap_or("");
            if tag_name.eq_ignore_ascii_case(name) {
                depth += 1;
            }
        }
        rest = &rest[gt + 1..];
    }
    rest
}

fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest[..rest.len().min(10)].find(';') else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            "nbsp" => out.push(' '),
            _ => {
                let decoded = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('&');
                        rest = &rest[1..];
                        continue;
                    }
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Position;

    fn roundtrip(input: &str) -> String {
        write(&read(input, &SanitizePolicy::default()))
    }

    #[test]
    fn test_plain_text_becomes_paragraph() {
        assert_eq!(roundtrip("Hello"), "<p>Hello</p>");
    }

    #[test]
    fn test_styled_runs() {
        assert_eq!(
            roundtrip("<p>a <b>bold <i>both</i></b> z</p>"),
            "<p>a <b>bold </b><b><i>both</i></b> z</p>"
        );
    }

    #[test]
    fn test_heading_and_quote() {
        assert_eq!(roundtrip("<h2>Title</h2>"), "<h2>Title</h2>");
        assert_eq!(
            roundtrip("<blockquote><p>quoted</p></blockquote>"),
            "<blockquote>quoted</blockquote>"
        );
        assert_eq!(
            roundtrip("<blockquote><blockquote>deep</blockquote></blockquote>"),
            "<blockquote><blockquote>deep</blockquote></blockquote>"
        );
    }

    #[test]
    fn test_lists_nest_by_indent() {
        let doc = read("<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>", &SanitizePolicy::default());
        assert_eq!(doc.block_count(), 3);
        assert_eq!(
            write(&doc),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>"
        );

        let nested = read("<ul><li>a</li><ul><li>sub</li></ul></ul>", &SanitizePolicy::default());
        assert_eq!(
            write(&nested),
            "<ul><li>a</li><ul><li>sub</li></ul></ul>"
        );
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            roundtrip("<p><a href=\"http://x.com\">x</a></p>"),
            "<p><a href=\"http://x.com\">x</a></p>"
        );
        assert_eq!(
            roundtrip("<p><img src=\"pic.png\"></p>"),
            "<p><img src=\"pic.png\"></p>"
        );
    }

    #[test]
    fn test_script_dropped_with_content() {
        assert_eq!(
            roundtrip("<p>safe</p><script>alert('x')</script><p>more</p>"),
            "<p>safe</p><p>more</p>"
        );
    }

    #[test]
    fn test_forbidden_attrs_dropped_at_read() {
        assert_eq!(
            roundtrip("<p style=\"color:red\" data-k=\"v\">x</p>"),
            "<p data-k=\"v\">x</p>"
        );
    }

    #[test]
    fn test_entities_roundtrip() {
        assert_eq!(roundtrip("<p>a &amp; b &lt;c&gt;</p>"), "<p>a &amp; b &lt;c&gt;</p>");
        assert_eq!(roundtrip("<p>&#65;</p>"), "<p>A</p>");
    }

    #[test]
    fn test_unknown_tags_unwrapped() {
        assert_eq!(roundtrip("<p><span>inside</span></p>"), "<p>inside</p>");
    }

    #[test]
    fn test_unclosed_style_stops_at_block_end() {
        assert_eq!(
            roundtrip("<p><b>x</p><p>y</p>"),
            "<p><b>x</b></p><p>y</p>"
        );
    }

    #[test]
    fn test_hr_is_a_block() {
        let doc = read("<p>a</p><hr><p>b</p>", &SanitizePolicy::default());
        assert_eq!(doc.block_count(), 3);
        assert_eq!(doc.clamp(Position::new(1, 9)), Position::new(1, 0));
        assert_eq!(write(&doc), "<p>a</p><hr><p>b</p>");
    }

    #[test]
    fn test_write_is_canonical() {
        let once = roundtrip("<div>x <em>y</em></div>");
        let twice = roundtrip(&once);
        assert_eq!(once, twice);
    }
}
