// Host boundary: the native primitives the editor core drives, plus
// `Surface`, the built-in in-memory host used as the reference
// implementation and by the test suite.

use crate::document::{
    inline_len, map_runs, runs_all, Block, BlockType, Document, InlineContent, Position,
    SanitizePolicy, TextStyle,
};
use crate::html;
use crate::range::Range;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Size { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

/// The native rich-text command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCommand {
    FormatBlock,
    Bold,
    Italic,
    Underline,
    InsertOrderedList,
    InsertUnorderedList,
    Indent,
    Outdent,
    CreateLink,
    Unlink,
    InsertImage,
    InsertHorizontalRule,
    InsertHtml,
}

impl NativeCommand {
    pub fn name(&self) -> &'static str {
        match self {
            NativeCommand::FormatBlock => "formatblock",
            NativeCommand::Bold => "bold",
            NativeCommand::Italic => "italic",
            NativeCommand::Underline => "underline",
            NativeCommand::InsertOrderedList => "insertorderedlist",
            NativeCommand::InsertUnorderedList => "insertunorderedlist",
            NativeCommand::Indent => "indent",
            NativeCommand::Outdent => "outdent",
            NativeCommand::CreateLink => "createlink",
            NativeCommand::Unlink => "unlink",
            NativeCommand::InsertImage => "insertimage",
            NativeCommand::InsertHorizontalRule => "inserthorizontalrule",
            NativeCommand::InsertHtml => "inserthtml",
        }
    }
}

/// A formatting-relevant element between a position and the container root,
/// innermost first.
#[derive(Debug, Clone, PartialEq)]
pub enum Ancestor {
    Bold,
    Italic,
    Underline,
    Code,
    Link(String),
    ListItem,
    OrderedList,
    UnorderedList,
    Block(BlockType),
}

impl Ancestor {
    /// The markup tag this ancestor corresponds to.
    pub fn tag(&self) -> &'static str {
        match self {
            Ancestor::Bold => "b",
            Ancestor::Italic => "i",
            Ancestor::Underline => "u",
            Ancestor::Code => "code",
            Ancestor::Link(_) => "a",
            Ancestor::ListItem => "li",
            Ancestor::OrderedList => "ol",
            Ancestor::UnorderedList => "ul",
            Ancestor::Block(bt) => bt.tag(),
        }
    }
}

/// Everything the editor core requires of its host environment. `Surface`
/// implements the whole contract in memory; an embedding over real native
/// primitives implements the same trait.
pub trait Host {
    fn document(&self) -> &Document;
    fn document_mut(&mut self) -> &mut Document;

    fn selection(&self) -> Option<Range>;
    /// Replace the host selection. Returns false if the host refuses.
    fn select(&mut self, range: Range) -> bool;
    fn clear_selection(&mut self);

    fn set_editable(&mut self, editable: bool);
    fn is_editable(&self) -> bool;
    fn add_class(&mut self, class: &str);
    fn matches_selector(&self, selector: &str) -> bool;

    /// Execute a native formatting command. Failures are signalled, never
    /// thrown.
    fn exec(&mut self, command: NativeCommand, value: Option<&str>) -> bool;

    fn range_rect(&self, range: &Range) -> Rect;
    fn container_rect(&self) -> Rect;
    fn viewport(&self) -> Size;

    fn has_unload_guard(&self) -> bool;
    fn install_unload_guard(&mut self);

    fn clamp(&self, pos: Position) -> Position {
        self.document().clamp(pos)
    }

    fn content_end(&self) -> Position {
        self.document().end_position()
    }

    fn text_in(&self, range: &Range) -> String {
        let r = range.normalized();
        self.document().text_in(r.start, r.end)
    }

    fn ancestors(&self, pos: Position) -> Vec<Ancestor> {
        ancestors_at(self.document(), pos)
    }
}

/// Formatting-relevant ancestors at a position, innermost first: inline
/// styles, then the enclosing link, then list/block structure.
pub fn ancestors_at(doc: &Document, pos: Position) -> Vec<Ancestor> {
    let mut chain = Vec::new();
    let pos = doc.clamp(pos);
    let Some(block) = doc.blocks().get(pos.block) else {
        return chain;
    };

    inline_chain(&block.content, pos.offset, &mut chain);

    match block.block_type {
        BlockType::ListItem { ordered, .. } => {
            chain.push(Ancestor::ListItem);
            chain.push(if ordered {
                Ancestor::OrderedList
            } else {
                Ancestor::UnorderedList
            });
        }
        bt => chain.push(Ancestor::Block(bt)),
    }
    chain
}

fn inline_chain(content: &[InlineContent], offset: usize, chain: &mut Vec<Ancestor>) {
    let mut pos = 0usize;
    for item in content {
        let len = item.text_len();
        // The run just before the cursor owns it, matching how hosts resolve
        // a caret sitting on a boundary.
        let within = if offset == 0 {
            pos == 0
        } else {
            pos < offset && offset <= pos + len
        };
        if within {
            match item {
                InlineContent::Text(run) => push_style_ancestors(run.style, chain),
                InlineContent::Link { href, content, .. } => {
                    inline_chain(content, offset - pos, chain);
                    chain.push(Ancestor::Link(href.clone()));
                }
                InlineContent::Image { .. } => {}
            }
            return;
        }
        pos += len;
    }
}

fn push_style_ancestors(style: TextStyle, chain: &mut Vec<Ancestor>) {
    if style.code {
        chain.push(Ancestor::Code);
    }
    if style.underline {
        chain.push(Ancestor::Underline);
    }
    if style.italic {
        chain.push(Ancestor::Italic);
    }
    if style.bold {
        chain.push(Ancestor::Bold);
    }
}

const CHAR_W: f64 = 8.0;
const LINE_H: f64 = 18.0;

/// In-memory reference host: one container element, its content, the page's
/// single selection, and a deterministic character-grid layout so geometry
/// queries have well-defined answers.
#[derive(Debug, Default)]
pub struct Surface {
    doc: Document,
    selection: Option<Range>,
    editable: bool,
    id: Option<String>,
    classes: Vec<String>,
    viewport: Size,
    scroll: Point,
    unload_guard: bool,
}

impl Default for Size {
    fn default() -> Self {
        Size::new(800.0, 600.0)
    }
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(markup: &str) -> Self {
        let mut surface = Self::new();
        // Native content arrives unsanitized; cleaning is the editor's job.
        surface.doc = html::read(markup, &permissive());
        surface
    }

    pub fn with_id(id: &str) -> Self {
        Surface {
            id: Some(id.to_string()),
            ..Self::new()
        }
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
    }

    pub fn set_scroll(&mut self, scroll: Point) {
        self.scroll = scroll;
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn content_html(&self) -> String {
        html::write(&self.doc)
    }

    fn clamp_selection(&mut self) {
        if let Some(sel) = self.selection {
            self.selection = Some(Range::new(self.doc.clamp(sel.start), self.doc.clamp(sel.end)));
        }
    }

    fn toggle_style(&mut self, range: Range, pick: fn(&TextStyle) -> bool, set: fn(&mut TextStyle, bool)) -> bool {
        let range = range.normalized();
        if range.is_collapsed() {
            return false;
        }
        let (a, b) = (range.start, range.end);

        // Decide the direction once over every selected run.
        let mut selected = Vec::new();
        for index in a.block..=b.block {
            let block = &self.doc.blocks()[index];
            let from = if index == a.block { a.offset } else { 0 };
            let to = if index == b.block { b.offset } else { block.text_len() };
            let (_, within, _) = block.split_range(from, to);
            selected.extend(within);
        }
        let enable = !runs_all(&selected, &pick);

        for index in a.block..=b.block {
            let block = &mut self.doc.blocks_mut()[index];
            let from = if index == a.block { a.offset } else { 0 };
            let to = if index == b.block { b.offset } else { block.text_len() };
            let (before, within, after) = block.split_range(from, to);
            let styled = map_runs(within, &mut |style| set(style, enable));
            block.content = before.into_iter().chain(styled).chain(after).collect();
        }
        true
    }

    fn toggle_list(&mut self, range: Range, ordered: bool) -> bool {
        let range = range.normalized();
        let (a, b) = (range.start.block, range.end.block);
        if self.doc.blocks().is_empty() {
            return false;
        }
        let all_this_flavor = self.doc.blocks()[a..=b]
            .iter()
            .all(|blk| matches!(blk.block_type, BlockType::ListItem { ordered: o, .. } if o == ordered));
        for block in &mut self.doc.blocks_mut()[a..=b] {
            block.block_type = if all_this_flavor {
                BlockType::Paragraph
            } else {
                let indent = match block.block_type {
                    BlockType::ListItem { indent, .. } => indent,
                    _ => 0,
                };
                BlockType::ListItem { ordered, indent }
            };
        }
        true
    }

    fn wrap_link(&mut self, range: Range, href: &str) -> bool {
        let range = range.normalized();
        if range.is_collapsed() {
            return false;
        }
        let (a, b) = (range.start, range.end);
        for index in a.block..=b.block {
            let block = &mut self.doc.blocks_mut()[index];
            let from = if index == a.block { a.offset } else { 0 };
            let to = if index == b.block { b.offset } else { block.text_len() };
            let (before, within, after) = block.split_range(from, to);
            // Nested anchors are invalid; flatten any existing ones first.
            let inner = unwrap_links(within);
            let mut content = before;
            if inline_len(&inner) > 0 {
                content.push(InlineContent::Link {
                    href: href.to_string(),
                    attrs: Vec::new(),
                    content: inner,
                });
            }
            content.extend(after);
            block.content = content;
        }
        true
    }

    fn unlink(&mut self, range: Range) -> bool {
        let range = range.normalized();
        let (a, b) = (range.start, range.end);
        if self.doc.blocks().is_empty() {
            return false;
        }
        let mut changed = false;
        for index in a.block..=b.block.min(self.doc.block_count() - 1) {
            let block = &mut self.doc.blocks_mut()[index];
            let from = if index == a.block { a.offset } else { 0 };
            let to = if index == b.block { b.offset } else { block.text_len() };
            let new_content: Vec<InlineContent> = {
                let mut out = Vec::new();
                let mut pos = 0usize;
                for item in block.content.drain(..) {
                    let len = item.text_len();
                    let intersects = if from == to {
                        // Caret: unwrap the link containing it.
                        pos < from && from <= pos + len || (from == 0 && pos == 0)
                    } else {
                        pos < to && pos + len > from
                    };
                    match item {
                        InlineContent::Link { content, .. } if intersects => {
                            changed = true;
                            out.extend(content);
                        }
                        other => out.push(other),
                    }
                    pos += len;
                }
                out
            };
            block.content = new_content;
        }
        changed
    }

    fn insert_fragment(&mut self, range: Range, markup: &str) -> bool {
        let range = range.normalized();
        if !range.is_collapsed() {
            self.doc.delete_range(range.start, range.end);
        }
        let caret = self.doc.clamp(range.start);
        let fragment = html::read(markup, &permissive());
        let frag_blocks: Vec<Block> = fragment.blocks().to_vec();
        if frag_blocks.is_empty() {
            self.selection = Some(Range::collapsed(caret));
            return true;
        }

        if self.doc.blocks().is_empty() {
            for block in &frag_blocks {
                self.doc.add_block(block.clone());
            }
            self.selection = Some(Range::collapsed(self.doc.end_position()));
            return true;
        }

        let (before, _, after) = self.doc.blocks()[caret.block].split_range(caret.offset, caret.offset);

        if frag_blocks.len() == 1 && matches!(frag_blocks[0].block_type, BlockType::Paragraph) {
            // A single paragraph splices inline, like pasted text.
            let inserted = inline_len(&frag_blocks[0].content);
            let block = &mut self.doc.blocks_mut()[caret.block];
            block.content = before
                .into_iter()
                .chain(frag_blocks[0].content.iter().cloned())
                .chain(after)
                .collect();
            self.selection = Some(Range::collapsed(Position::new(
                caret.block,
                caret.offset + inserted,
            )));
            return true;
        }

        // Block-level fragment: head keeps the lead-in, the tail content is
        // re-attached after the last inserted block.
        self.doc.blocks_mut()[caret.block].content = before;
        let mut insert_at = caret.block + 1;
        for block in &frag_blocks {
            self.doc.insert_block(insert_at, block.clone());
            insert_at += 1;
        }
        if inline_len(&after) > 0 {
            let mut tail = Block::paragraph();
            tail.content = after;
            self.doc.insert_block(insert_at, tail);
        }
        let last = insert_at - 1;
        self.selection = Some(Range::collapsed(Position::new(
            last,
            self.doc.blocks()[last].text_len(),
        )));
        true
    }

    fn insert_rule(&mut self, range: Range) -> bool {
        let caret = self.doc.clamp(range.normalized().start);
        if self.doc.blocks().is_empty() {
            self.doc.add_block(Block::new(BlockType::HorizontalRule));
            self.selection = Some(Range::collapsed(Position::start()));
            return true;
        }
        let block_len = self.doc.blocks()[caret.block].text_len();
        let at = if caret.offset >= block_len {
            caret.block + 1
        } else {
            // Split the block and drop the rule between the halves.
            let (before, _, after) = self.doc.blocks()[caret.block].split_range(caret.offset, caret.offset);
            let block_type = self.doc.blocks()[caret.block].block_type;
            self.doc.blocks_mut()[caret.block].content = before;
            let mut tail = Block::new(block_type);
            tail.content = after;
            self.doc.insert_block(caret.block + 1, tail);
            caret.block + 1
        };
        self.doc.insert_block(at, Block::new(BlockType::HorizontalRule));
        let after_rule = (at + 1).min(self.doc.block_count() - 1);
        self.selection = Some(Range::collapsed(Position::new(after_rule, 0)));
        true
    }

    fn format_block(&mut self, range: Range, tag: &str) -> bool {
        let target = match tag {
            "p" => BlockType::Paragraph,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => BlockType::Heading {
                level: tag[1..].parse().unwrap_or(6),
            },
            "blockquote" => BlockType::Blockquote { depth: 1 },
            "pre" => BlockType::Preformatted,
            _ => return false,
        };
        let range = range.normalized();
        if self.doc.blocks().is_empty() {
            return false;
        }
        for block in &mut self.doc.blocks_mut()[range.start.block..=range.end.block] {
            if matches!(block.block_type, BlockType::HorizontalRule) {
                continue;
            }
            block.block_type = match (block.block_type, target) {
                // Formatting a quote as a quote nests it one deeper.
                (BlockType::Blockquote { depth }, BlockType::Blockquote { .. }) => {
                    BlockType::Blockquote {
                        depth: depth.saturating_add(1),
                    }
                }
                (_, t) => t,
            };
        }
        true
    }

    fn indent(&mut self, range: Range, outward: bool) -> bool {
        let range = range.normalized();
        if self.doc.blocks().is_empty() {
            return false;
        }
        let mut changed = false;
        for block in &mut self.doc.blocks_mut()[range.start.block..=range.end.block] {
            let next = match (block.block_type, outward) {
                (BlockType::ListItem { ordered, indent }, false) => Some(BlockType::ListItem {
                    ordered,
                    indent: (indent + 1).min(8),
                }),
                (BlockType::ListItem { ordered, indent }, true) => Some(if indent > 0 {
                    BlockType::ListItem {
                        ordered,
                        indent: indent - 1,
                    }
                } else {
                    BlockType::Paragraph
                }),
                (BlockType::Blockquote { depth }, false) => Some(BlockType::Blockquote {
                    depth: depth.saturating_add(1),
                }),
                (BlockType::Blockquote { depth }, true) => Some(if depth > 1 {
                    BlockType::Blockquote { depth: depth - 1 }
                } else {
                    BlockType::Paragraph
                }),
                (BlockType::HorizontalRule, _) => None,
                (_, false) => Some(BlockType::Blockquote { depth: 1 }),
                (_, true) => None,
            };
            if let Some(next) = next
                && next != block.block_type
            {
                block.block_type = next;
                changed = true;
            }
        }
        changed
    }
}

/// Policy that lets everything through; native-level operations do not clean.
fn permissive() -> SanitizePolicy {
    SanitizePolicy {
        attrs: Vec::new(),
        tags: Vec::new(),
    }
}

fn unwrap_links(content: Vec<InlineContent>) -> Vec<InlineContent> {
    let mut out = Vec::new();
    for item in content {
        match item {
            InlineContent::Link { content, .. } => out.extend(unwrap_links(content)),
            other => out.push(other),
        }
    }
    out
}

impl Host for Surface {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn selection(&self) -> Option<Range> {
        self.selection
    }

    fn select(&mut self, range: Range) -> bool {
        self.selection = Some(range);
        true
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn add_class(&mut self, class: &str) {
        if !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_string());
        }
    }

    fn matches_selector(&self, selector: &str) -> bool {
        selector
            .strip_prefix('#')
            .is_some_and(|id| self.id.as_deref() == Some(id))
    }

    fn exec(&mut self, command: NativeCommand, value: Option<&str>) -> bool {
        if !self.editable {
            return false;
        }
        let Some(selection) = self.selection else {
            return false;
        };
        let range = Range::new(self.doc.clamp(selection.start), self.doc.clamp(selection.end));

        let applied = match command {
            NativeCommand::FormatBlock => match value {
                Some(tag) => self.format_block(range, &tag.to_ascii_lowercase()),
                None => false,
            },
            NativeCommand::Bold => {
                self.toggle_style(range, |s| s.bold, |s, on| s.bold = on)
            }
            NativeCommand::Italic => {
                self.toggle_style(range, |s| s.italic, |s, on| s.italic = on)
            }
            NativeCommand::Underline => {
                self.toggle_style(range, |s| s.underline, |s, on| s.underline = on)
            }
            NativeCommand::InsertOrderedList => self.toggle_list(range, true),
            NativeCommand::InsertUnorderedList => self.toggle_list(range, false),
            NativeCommand::Indent => self.indent(range, false),
            NativeCommand::Outdent => self.indent(range, true),
            NativeCommand::CreateLink => match value {
                Some(url) if !url.is_empty() => self.wrap_link(range, url),
                _ => false,
            },
            NativeCommand::Unlink => self.unlink(range),
            NativeCommand::InsertImage => match value {
                Some(src) if !src.is_empty() => {
                    let caret = if range.is_collapsed() {
                        range.start
                    } else {
                        self.doc.delete_range(range.start, range.end);
                        self.doc.clamp(range.normalized().start)
                    };
                    if self.doc.blocks().is_empty() {
                        self.doc.add_block(Block::paragraph());
                    }
                    let caret = self.doc.clamp(caret);
                    let block = &mut self.doc.blocks_mut()[caret.block];
                    let (before, _, after) = block.split_range(caret.offset, caret.offset);
                    let image = InlineContent::Image {
                        src: src.to_string(),
                        attrs: Vec::new(),
                    };
                    block.content = before.into_iter().chain([image]).chain(after).collect();
                    self.selection =
                        Some(Range::collapsed(Position::new(caret.block, caret.offset + 1)));
                    true
                }
                _ => false,
            },
            NativeCommand::InsertHorizontalRule => self.insert_rule(range),
            NativeCommand::InsertHtml => match value {
                Some(markup) => self.insert_fragment(range, markup),
                None => false,
            },
        };

        self.clamp_selection();
        applied
    }

    fn range_rect(&self, range: &Range) -> Rect {
        let r = range.normalized();
        let start = self.doc.clamp(r.start);
        let end = self.doc.clamp(r.end);
        let x = start.offset as f64 * CHAR_W - self.scroll.x;
        let y = start.block as f64 * LINE_H - self.scroll.y;
        let w = if start.block == end.block {
            (end.offset.saturating_sub(start.offset)) as f64 * CHAR_W
        } else {
            let line_len = self
                .doc
                .blocks()
                .get(start.block)
                .map(|b| b.text_len())
                .unwrap_or(0);
            (line_len.saturating_sub(start.offset)) as f64 * CHAR_W
        };
        let h = (end.block - start.block + 1) as f64 * LINE_H;
        Rect::new(x, y, w, h)
    }

    fn container_rect(&self) -> Rect {
        let h = self.doc.block_count() as f64 * LINE_H;
        Rect::new(-self.scroll.x, -self.scroll.y, self.viewport.w, h)
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn has_unload_guard(&self) -> bool {
        self.unload_guard
    }

    fn install_unload_guard(&mut self) {
        self.unload_guard = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editable(markup: &str) -> Surface {
        let mut s = Surface::with_content(markup);
        s.set_editable(true);
        s
    }

    fn select_all_of_block(s: &mut Surface, block: usize) {
        let len = s.document().blocks()[block].text_len();
        s.select(Range::new(Position::new(block, 0), Position::new(block, len)));
    }

    #[test]
    fn test_bold_toggle_roundtrip() {
        let mut s = editable("<p>Hello</p>");
        select_all_of_block(&mut s, 0);

        assert!(s.exec(NativeCommand::Bold, None));
        assert_eq!(s.content_html(), "<p><b>Hello</b></p>");

        assert!(s.exec(NativeCommand::Bold, None));
        assert_eq!(s.content_html(), "<p>Hello</p>");
    }

    #[test]
    fn test_bold_mixed_selection_applies_everywhere() {
        let mut s = editable("<p><b>He</b>llo</p>");
        select_all_of_block(&mut s, 0);
        assert!(s.exec(NativeCommand::Bold, None));
        // Mixed styling means the toggle applies rather than clears.
        assert_eq!(s.content_html(), "<p><b>He</b><b>llo</b></p>");
    }

    #[test]
    fn test_format_block_heading() {
        let mut s = editable("<p>Title</p>");
        s.select(Range::collapsed(Position::new(0, 2)));
        assert!(s.exec(NativeCommand::FormatBlock, Some("h2")));
        assert_eq!(s.content_html(), "<h2>Title</h2>");
    }

    #[test]
    fn test_blockquote_outdent_lifts_one_level() {
        let mut s = editable("<blockquote><blockquote>deep</blockquote></blockquote>");
        s.select(Range::collapsed(Position::new(0, 0)));
        assert!(s.exec(NativeCommand::Outdent, None));
        assert_eq!(s.content_html(), "<blockquote>deep</blockquote>");
        assert!(s.exec(NativeCommand::Outdent, None));
        assert_eq!(s.content_html(), "<p>deep</p>");
    }

    #[test]
    fn test_list_toggle_and_indent() {
        let mut s = editable("<p>a</p>");
        s.select(Range::collapsed(Position::new(0, 0)));
        assert!(s.exec(NativeCommand::InsertUnorderedList, None));
        assert_eq!(s.content_html(), "<ul><li>a</li></ul>");

        assert!(s.exec(NativeCommand::Indent, None));
        assert_eq!(s.content_html(), "<ul><ul><li>a</li></ul></ul>");

        assert!(s.exec(NativeCommand::Outdent, None));
        assert!(s.exec(NativeCommand::Outdent, None));
        assert_eq!(s.content_html(), "<p>a</p>");
    }

    #[test]
    fn test_list_flavor_switch() {
        let mut s = editable("<ul><li>a</li></ul>");
        s.select(Range::collapsed(Position::new(0, 0)));
        assert!(s.exec(NativeCommand::InsertOrderedList, None));
        assert_eq!(s.content_html(), "<ol><li>a</li></ol>");
        assert!(s.exec(NativeCommand::InsertOrderedList, None));
        assert_eq!(s.content_html(), "<p>a</p>");
    }

    #[test]
    fn test_create_and_remove_link() {
        let mut s = editable("<p>read this now</p>");
        s.select(Range::new(Position::new(0, 5), Position::new(0, 9)));
        assert!(s.exec(NativeCommand::CreateLink, Some("http://x.com")));
        assert_eq!(
            s.content_html(),
            "<p>read <a href=\"http://x.com\">this</a> now</p>"
        );

        // Caret inside the link is enough for unlink.
        s.select(Range::collapsed(Position::new(0, 7)));
        assert!(s.exec(NativeCommand::Unlink, None));
        assert_eq!(s.content_html(), "<p>read this now</p>");
    }

    #[test]
    fn test_horizontal_rule_attaches_after_block() {
        let mut s = editable("<p>ab</p><p>cd</p>");
        s.select(Range::collapsed(Position::new(0, 2)));
        assert!(s.exec(NativeCommand::InsertHorizontalRule, None));
        assert_eq!(s.content_html(), "<p>ab</p><hr><p>cd</p>");
    }

    #[test]
    fn test_insert_html_inline_fragment() {
        let mut s = editable("<p>ab</p>");
        s.select(Range::new(Position::new(0, 1), Position::new(0, 2)));
        assert!(s.exec(NativeCommand::InsertHtml, Some("<code>x</code>")));
        assert_eq!(s.content_html(), "<p>a<code>x</code></p>");
        // Caret lands after the insertion.
        assert_eq!(s.selection(), Some(Range::collapsed(Position::new(0, 2))));
    }

    #[test]
    fn test_exec_requires_editable_and_selection() {
        let mut s = Surface::with_content("<p>x</p>");
        s.select(Range::collapsed(Position::start()));
        assert!(!s.exec(NativeCommand::Bold, None), "not editable yet");

        s.set_editable(true);
        s.clear_selection();
        assert!(!s.exec(NativeCommand::Bold, None), "no selection");
    }

    #[test]
    fn test_ancestor_chain() {
        let s = Surface::with_content("<p>a <b><i>bi</i></b> <a href=\"http://x\">link</a></p>");
        // Inside the bold-italic run
        let chain = s.ancestors(Position::new(0, 4));
        assert_eq!(
            chain,
            vec![
                Ancestor::Italic,
                Ancestor::Bold,
                Ancestor::Block(BlockType::Paragraph)
            ]
        );
        // Inside the link
        let chain = s.ancestors(Position::new(0, 7));
        assert!(chain.contains(&Ancestor::Link("http://x".to_string())));
    }

    #[test]
    fn test_ancestor_chain_in_list() {
        let s = Surface::with_content("<ol><li>one</li></ol>");
        let chain = s.ancestors(Position::new(0, 1));
        assert_eq!(chain, vec![Ancestor::ListItem, Ancestor::OrderedList]);
    }
}
