// Structured content model for the editable surface.
// Independent of any particular host; HTML is the interchange format.

use std::cmp::min;

/// Attribute list as parsed from markup, in source order.
pub type Attrs = Vec<(String, String)>;

/// Inline text styling (semantic, not syntactic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub code: bool,
}

impl TextStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        TextStyle {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        TextStyle {
            italic: true,
            ..Default::default()
        }
    }

    pub fn code() -> Self {
        TextStyle {
            code: true,
            ..Default::default()
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A run of text with uniform styling
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        TextRun {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::plain())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this run at the given byte offset, returning (left, right).
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let (left, right) = self.text.split_at(offset);
        (
            TextRun::new(left, self.style),
            TextRun::new(right, self.style),
        )
    }
}

/// Inline content that can appear within a block
#[derive(Debug, Clone, PartialEq)]
pub enum InlineContent {
    Text(TextRun),
    Link {
        href: String,
        attrs: Attrs,
        content: Vec<InlineContent>,
    },
    Image {
        src: String,
        attrs: Attrs,
    },
}

impl InlineContent {
    /// Logical length of this content. Replaced elements count as one
    /// position, the way hosts treat them for cursor math.
    pub fn text_len(&self) -> usize {
        match self {
            InlineContent::Text(run) => run.len(),
            InlineContent::Link { content, .. } => content.iter().map(|c| c.text_len()).sum(),
            InlineContent::Image { .. } => 1,
        }
    }

    pub fn to_plain_text(&self) -> String {
        match self {
            InlineContent::Text(run) => run.text.clone(),
            InlineContent::Link { content, .. } => {
                content.iter().map(|c| c.to_plain_text()).collect()
            }
            InlineContent::Image { .. } => String::new(),
        }
    }
}

/// Block-level content types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Paragraph,
    Heading { level: u8 }, // 1-6
    Blockquote { depth: u8 },
    Preformatted,
    ListItem { ordered: bool, indent: u8 },
    HorizontalRule,
}

impl BlockType {
    /// The markup tag this block serializes as.
    pub fn tag(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "p",
            BlockType::Heading { level } => match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            BlockType::Blockquote { .. } => "blockquote",
            BlockType::Preformatted => "pre",
            BlockType::ListItem { .. } => "li",
            BlockType::HorizontalRule => "hr",
        }
    }
}

/// A block of content
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub block_type: BlockType,
    pub attrs: Attrs,
    pub content: Vec<InlineContent>,
}

impl Block {
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type,
            attrs: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn paragraph() -> Self {
        Self::new(BlockType::Paragraph)
    }

    pub fn heading(level: u8) -> Self {
        Self::new(BlockType::Heading {
            level: level.clamp(1, 6),
        })
    }

    pub fn with_text(mut self, text: impl Into<String>, style: TextStyle) -> Self {
        self.content
            .push(InlineContent::Text(TextRun::new(text, style)));
        self
    }

    pub fn with_plain_text(self, text: impl Into<String>) -> Self {
        self.with_text(text, TextStyle::plain())
    }

    pub fn text_len(&self) -> usize {
        self.content.iter().map(|c| c.text_len()).sum()
    }

    pub fn to_plain_text(&self) -> String {
        self.content.iter().map(|c| c.to_plain_text()).collect()
    }

    /// True when the block carries no text and no embedded media.
    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|c| match c {
            InlineContent::Text(run) => run.text.trim().is_empty(),
            InlineContent::Link { content, .. } => {
                content.iter().all(|c| c.to_plain_text().trim().is_empty())
            }
            InlineContent::Image { .. } => false,
        })
    }

    /// Split this block's content into (before, within, after) around the
    /// flattened offsets [start..end).
    pub fn split_range(
        &self,
        start: usize,
        end: usize,
    ) -> (Vec<InlineContent>, Vec<InlineContent>, Vec<InlineContent>) {
        let len = self.text_len();
        split_inline(&self.content, min(start, len), min(end, len))
    }
}

/// Split inline content three ways around [start..end). Links are split
/// recursively so a partial selection keeps both halves linked; images are
/// atomic and land wherever their position falls.
pub fn split_inline(
    content: &[InlineContent],
    start: usize,
    end: usize,
) -> (Vec<InlineContent>, Vec<InlineContent>, Vec<InlineContent>) {
    let mut before = Vec::new();
    let mut within = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0usize;

    for item in content {
        let len = item.text_len();
        let item_start = pos;
        let item_end = pos + len;
        pos = item_end;

        if item_end <= start && !(item_start >= start && item_end <= end) {
            before.push(item.clone());
            continue;
        }
        if item_start >= end && !(item_start >= start && item_end <= end) {
            after.push(item.clone());
            continue;
        }
        if item_start >= start && item_end <= end {
            within.push(item.clone());
            continue;
        }

        match item {
            InlineContent::Text(run) => {
                let sel_start = start.saturating_sub(item_start);
                let sel_end = min(len, end.saturating_sub(item_start));
                if sel_start > 0 {
                    let (head, _) = run.split_at(sel_start);
                    before.push(InlineContent::Text(head));
                }
                if sel_end > sel_start {
                    let mid = TextRun::new(&run.text[sel_start..sel_end], run.style);
                    within.push(InlineContent::Text(mid));
                }
                if sel_end < len {
                    let (_, tail) = run.split_at(sel_end);
                    after.push(InlineContent::Text(tail));
                }
            }
            InlineContent::Link {
                href,
                attrs,
                content: inner,
            } => {
                let sel_start = start.saturating_sub(item_start);
                let sel_end = min(len, end.saturating_sub(item_start));
                let (b, w, a) = split_inline(inner, sel_start, sel_end);
                for (part, dest) in [(b, &mut before), (w, &mut within), (a, &mut after)] {
                    if inline_len(&part) > 0 {
                        dest.push(InlineContent::Link {
                            href: href.clone(),
                            attrs: attrs.clone(),
                            content: part,
                        });
                    }
                }
            }
            InlineContent::Image { .. } => {
                if item_start < start {
                    before.push(item.clone());
                } else {
                    within.push(item.clone());
                }
            }
        }
    }

    (before, within, after)
}

pub fn inline_len(content: &[InlineContent]) -> usize {
    content.iter().map(|c| c.text_len()).sum()
}

/// Apply a style mutation to every text run, descending into links.
pub fn map_runs<F>(content: Vec<InlineContent>, apply: &mut F) -> Vec<InlineContent>
where
    F: FnMut(&mut TextStyle),
{
    content
        .into_iter()
        .map(|item| match item {
            InlineContent::Text(mut run) => {
                apply(&mut run.style);
                InlineContent::Text(run)
            }
            InlineContent::Link {
                href,
                attrs,
                content,
            } => InlineContent::Link {
                href,
                attrs,
                content: map_runs(content, apply),
            },
            image => image,
        })
        .collect()
}

/// True when every text run satisfies the predicate. Content with no text
/// runs reports false, so toggles on it apply rather than clear.
pub fn runs_all<F>(content: &[InlineContent], pred: &F) -> bool
where
    F: Fn(&TextStyle) -> bool,
{
    fn walk<F: Fn(&TextStyle) -> bool>(
        content: &[InlineContent],
        pred: &F,
        any: &mut bool,
    ) -> bool {
        content.iter().all(|item| match item {
            InlineContent::Text(run) => {
                *any = true;
                pred(&run.style)
            }
            InlineContent::Link { content, .. } => walk(content, pred, any),
            InlineContent::Image { .. } => true,
        })
    }

    let mut any = false;
    walk(content, pred, &mut any) && any
}

/// A logical position within a document: block index plus a byte offset into
/// the block's flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Position { block, offset }
    }

    pub fn start() -> Self {
        Position::new(0, 0)
    }
}

/// What gets stripped during sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizePolicy {
    pub attrs: Vec<String>,
    pub tags: Vec<String>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        SanitizePolicy {
            attrs: ["id", "class", "style", "name"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tags: vec!["script".to_string()],
        }
    }
}

impl SanitizePolicy {
    pub fn forbids_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    pub fn forbids_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// The container's content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraph(text: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.add_block(Block::paragraph().with_plain_text(text));
        doc
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn insert_block(&mut self, index: usize, block: Block) {
        self.blocks.insert(min(index, self.blocks.len()), block);
    }

    pub fn remove_block(&mut self, index: usize) -> Option<Block> {
        if index < self.blocks.len() {
            Some(self.blocks.remove(index))
        } else {
            None
        }
    }

    /// Clamp a position to document bounds.
    pub fn clamp(&self, pos: Position) -> Position {
        if self.blocks.is_empty() {
            return Position::start();
        }
        let block = pos.block.min(self.blocks.len() - 1);
        let offset = pos.offset.min(self.blocks[block].text_len());
        Position::new(block, offset)
    }

    /// Position just past the last block's content.
    pub fn end_position(&self) -> Position {
        match self.blocks.last() {
            Some(block) => Position::new(self.blocks.len() - 1, block.text_len()),
            None => Position::start(),
        }
    }

    /// Semantic emptiness: no text, no embedded media, no block-level
    /// structure beyond bare paragraphs.
    pub fn is_empty(&self) -> bool {
        self.blocks
            .iter()
            .all(|b| matches!(b.block_type, BlockType::Paragraph) && b.is_blank())
    }

    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.to_plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Flattened text covered by [start..end).
    pub fn text_in(&self, start: Position, end: Position) -> String {
        if self.blocks.is_empty() {
            return String::new();
        }
        let a = self.clamp(start);
        let b = self.clamp(end);
        let (a, b) = if b < a { (b, a) } else { (a, b) };
        let mut parts = Vec::new();
        for index in a.block..=b.block {
            let block = &self.blocks[index];
            let from = if index == a.block { a.offset } else { 0 };
            let to = if index == b.block {
                b.offset
            } else {
                block.text_len()
            };
            let (_, within, _) = block.split_range(from, to);
            parts.push(within.iter().map(|c| c.to_plain_text()).collect::<String>());
        }
        parts.join("\n")
    }

    /// Delete [start..end). A cross-block range merges the tail of the end
    /// block into the start block and drops fully covered blocks in between.
    pub fn delete_range(&mut self, start: Position, end: Position) {
        if self.blocks.is_empty() {
            return;
        }
        let a = self.clamp(start);
        let b = self.clamp(end);
        let (a, b) = if b < a { (b, a) } else { (a, b) };

        if a.block == b.block {
            let block = &mut self.blocks[a.block];
            let (before, _, after) = block.split_range(a.offset, b.offset);
            block.content = before.into_iter().chain(after).collect();
            return;
        }

        let start_len = self.blocks[a.block].text_len();
        let (head, _, _) = self.blocks[a.block].split_range(a.offset, start_len);
        let (_, _, tail) = self.blocks[b.block].split_range(0, b.offset);
        self.blocks[a.block].content = head.into_iter().chain(tail).collect();
        self.blocks.drain(a.block + 1..=b.block);
    }

    /// Strip forbidden attributes and tags, then canonicalize runs. Running
    /// this twice produces the same result as running it once.
    pub fn sanitize(&mut self, policy: &SanitizePolicy) {
        self.blocks
            .retain(|b| !policy.forbids_tag(b.block_type.tag()));
        for block in &mut self.blocks {
            block.attrs.retain(|(name, _)| !policy.forbids_attr(name));
            let content = std::mem::take(&mut block.content);
            block.content = normalize_inline(sanitize_inline(content, policy));
        }
    }
}

fn sanitize_inline(content: Vec<InlineContent>, policy: &SanitizePolicy) -> Vec<InlineContent> {
    let mut out = Vec::new();
    for item in content {
        match item {
            InlineContent::Text(mut run) => {
                // Forbidding a style tag strips the markup but keeps the text.
                if policy.forbids_tag("b") || policy.forbids_tag("strong") {
                    run.style.bold = false;
                }
                if policy.forbids_tag("i") || policy.forbids_tag("em") {
                    run.style.italic = false;
                }
                if policy.forbids_tag("u") {
                    run.style.underline = false;
                }
                if policy.forbids_tag("code") {
                    run.style.code = false;
                }
                out.push(InlineContent::Text(run));
            }
            InlineContent::Link {
                href,
                mut attrs,
                content,
            } => {
                if policy.forbids_tag("a") {
                    continue;
                }
                attrs.retain(|(name, _)| !policy.forbids_attr(name));
                out.push(InlineContent::Link {
                    href,
                    attrs,
                    content: sanitize_inline(content, policy),
                });
            }
            InlineContent::Image { src, mut attrs } => {
                if policy.forbids_tag("img") {
                    continue;
                }
                attrs.retain(|(name, _)| !policy.forbids_attr(name));
                out.push(InlineContent::Image { src, attrs });
            }
        }
    }
    out
}

/// Merge adjacent runs with identical style and drop empty ones, so content
/// that went through a toggle round-trip serializes to canonical bytes.
pub fn normalize_inline(content: Vec<InlineContent>) -> Vec<InlineContent> {
    let mut out: Vec<InlineContent> = Vec::new();
    for item in content {
        match item {
            InlineContent::Text(run) => {
                if run.is_empty() {
                    continue;
                }
                if let Some(InlineContent::Text(last)) = out.last_mut()
                    && last.style == run.style
                {
                    last.text.push_str(&run.text);
                    continue;
                }
                out.push(InlineContent::Text(run));
            }
            InlineContent::Link {
                href,
                attrs,
                content,
            } => {
                let inner = normalize_inline(content);
                if inline_len(&inner) > 0 {
                    out.push(InlineContent::Link {
                        href,
                        attrs,
                        content: inner,
                    });
                }
            }
            image => out.push(image),
        }
    }
    out
}
