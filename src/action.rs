// Toolbar actions and how each one reaches the host.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::Position;
use crate::host::{Host, NativeCommand};
use crate::html;
use crate::range::Range;

/// How an action is carried out. Every action belongs to exactly one
/// strategy; an unknown action name belongs to none and is ignored upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Reformat whole blocks, toggling off when already active.
    Block,
    /// Pass straight through to the native inline command.
    Inline,
    /// Needs a user-supplied value (a URL) before it can run.
    Source,
    /// Insert standalone content after the current block.
    Insert,
    /// Wrap the selected text in an element.
    Wrap,
}

/// Everything the toolbar can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Paragraph,
    Heading(u8),
    Blockquote,
    Preformatted,
    Bold,
    Italic,
    Underline,
    OrderedList,
    UnorderedList,
    Indent,
    Outdent,
    CreateLink,
    RemoveLink,
    InsertImage,
    HorizontalRule,
    InlineCode,
}

impl Action {
    /// Parse a toolbar action name. Unknown names yield `None` rather than an
    /// error; callers decide whether to warn.
    pub fn parse(name: &str) -> Option<Action> {
        Some(match name {
            "p" => Action::Paragraph,
            "h1" => Action::Heading(1),
            "h2" => Action::Heading(2),
            "h3" => Action::Heading(3),
            "h4" => Action::Heading(4),
            "h5" => Action::Heading(5),
            "h6" => Action::Heading(6),
            "blockquote" => Action::Blockquote,
            "pre" => Action::Preformatted,
            "bold" => Action::Bold,
            "italic" => Action::Italic,
            "underline" => Action::Underline,
            "insertorderedlist" => Action::OrderedList,
            "insertunorderedlist" => Action::UnorderedList,
            "indent" => Action::Indent,
            "outdent" => Action::Outdent,
            "createlink" => Action::CreateLink,
            "unlink" => Action::RemoveLink,
            "insertimage" => Action::InsertImage,
            "inserthorizontalrule" => Action::HorizontalRule,
            "code" => Action::InlineCode,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Paragraph => "p",
            Action::Heading(1) => "h1",
            Action::Heading(2) => "h2",
            Action::Heading(3) => "h3",
            Action::Heading(4) => "h4",
            Action::Heading(5) => "h5",
            Action::Heading(_) => "h6",
            Action::Blockquote => "blockquote",
            Action::Preformatted => "pre",
            Action::Bold => "bold",
            Action::Italic => "italic",
            Action::Underline => "underline",
            Action::OrderedList => "insertorderedlist",
            Action::UnorderedList => "insertunorderedlist",
            Action::Indent => "indent",
            Action::Outdent => "outdent",
            Action::CreateLink => "createlink",
            Action::RemoveLink => "unlink",
            Action::InsertImage => "insertimage",
            Action::HorizontalRule => "inserthorizontalrule",
            Action::InlineCode => "code",
        }
    }

    /// Display label for a built-in toolbar icon.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Paragraph => "P",
            Action::Heading(1) => "H1",
            Action::Heading(2) => "H2",
            Action::Heading(3) => "H3",
            Action::Heading(4) => "H4",
            Action::Heading(5) => "H5",
            Action::Heading(_) => "H6",
            Action::Blockquote => "Quote",
            Action::Preformatted => "Pre",
            Action::Bold => "Bold",
            Action::Italic => "Italic",
            Action::Underline => "Underline",
            Action::OrderedList => "Ordered list",
            Action::UnorderedList => "Unordered list",
            Action::Indent => "Indent",
            Action::Outdent => "Outdent",
            Action::CreateLink => "Link",
            Action::RemoveLink => "Unlink",
            Action::InsertImage => "Image",
            Action::HorizontalRule => "Rule",
            Action::InlineCode => "Code",
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Action::Paragraph
            | Action::Heading(_)
            | Action::Blockquote
            | Action::Preformatted => Strategy::Block,
            Action::Bold
            | Action::Italic
            | Action::Underline
            | Action::OrderedList
            | Action::UnorderedList
            | Action::Indent
            | Action::Outdent => Strategy::Inline,
            Action::CreateLink | Action::RemoveLink | Action::InsertImage => Strategy::Source,
            Action::HorizontalRule => Strategy::Insert,
            Action::InlineCode => Strategy::Wrap,
        }
    }

    /// True for actions that open the URL input instead of running directly.
    pub fn wants_input(&self) -> bool {
        matches!(self, Action::CreateLink | Action::InsertImage)
    }

    fn block_tag(&self) -> &'static str {
        match self {
            Action::Paragraph => "p",
            Action::Heading(_) => self.name(),
            Action::Blockquote => "blockquote",
            Action::Preformatted => "pre",
            _ => "",
        }
    }

    fn inline_command(&self) -> Option<NativeCommand> {
        Some(match self {
            Action::Bold => NativeCommand::Bold,
            Action::Italic => NativeCommand::Italic,
            Action::Underline => NativeCommand::Underline,
            Action::OrderedList => NativeCommand::InsertOrderedList,
            Action::UnorderedList => NativeCommand::InsertUnorderedList,
            Action::Indent => NativeCommand::Indent,
            Action::Outdent => NativeCommand::Outdent,
            _ => return None,
        })
    }
}

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.-]*:").expect("scheme pattern"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern"));

/// Normalize user-typed link targets: whitespace is trimmed, bare email
/// addresses become `mailto:` links, and anything without a scheme gets
/// `http://` so the link leaves the page instead of resolving relatively.
pub fn normalize_url(raw: &str) -> String {
    let url = raw.trim();
    if url.is_empty() {
        return String::new();
    }
    // A value that already carries a scheme passes through untouched, even
    // when the rest of it looks like an email address.
    if SCHEME.is_match(url) || url.starts_with('/') || url.starts_with('#') {
        return url.to_string();
    }
    if EMAIL.is_match(url) {
        return format!("mailto:{url}");
    }
    format!("http://{url}")
}

/// Run one action against the host, using the strategy it belongs to.
/// Returns whether the host reported the command as applied.
pub fn apply(host: &mut dyn Host, action: Action, value: Option<&str>) -> bool {
    match action.strategy() {
        Strategy::Block => {
            let caret = caret(host);
            let tag = action.block_tag();
            let active = host.ancestors(caret).iter().any(|a| a.tag() == tag);
            if active {
                // Toggling an active block format returns to a paragraph;
                // quotes unwind one level at a time instead.
                if matches!(action, Action::Blockquote) {
                    host.exec(NativeCommand::Outdent, None)
                } else {
                    host.exec(NativeCommand::FormatBlock, Some("p"))
                }
            } else {
                host.exec(NativeCommand::FormatBlock, Some(tag))
            }
        }
        Strategy::Inline => match action.inline_command() {
            Some(command) => host.exec(command, None),
            None => false,
        },
        Strategy::Source => match action {
            Action::CreateLink => {
                let url = normalize_url(value.unwrap_or(""));
                if url.is_empty() {
                    // An emptied link input means "remove the link".
                    host.exec(NativeCommand::Unlink, None)
                } else {
                    host.exec(NativeCommand::CreateLink, Some(&url))
                }
            }
            Action::RemoveLink => host.exec(NativeCommand::Unlink, None),
            Action::InsertImage => match value {
                Some(src) if !src.trim().is_empty() => {
                    host.exec(NativeCommand::InsertImage, Some(src.trim()))
                }
                _ => false,
            },
            _ => false,
        },
        Strategy::Insert => {
            // Collapse to the end of the current block first so the inserted
            // content lands between blocks, never mid-text.
            let caret = caret(host);
            let block_end = host
                .document()
                .blocks()
                .get(caret.block)
                .map(|b| b.text_len())
                .unwrap_or(0);
            host.select(Range::collapsed(Position::new(caret.block, block_end)));
            host.exec(NativeCommand::InsertHorizontalRule, None)
        }
        Strategy::Wrap => {
            let Some(selection) = host.selection() else {
                return false;
            };
            let text = host.text_in(&selection);
            if text.is_empty() {
                return false;
            }
            let markup = format!("<code>{}</code>", html::escape(&text));
            host.exec(NativeCommand::InsertHtml, Some(&markup))
        }
    }
}

fn caret(host: &dyn Host) -> Position {
    host.selection()
        .map(|r| host.clamp(r.normalized().start))
        .unwrap_or_else(|| host.content_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Surface;

    fn editable(markup: &str) -> Surface {
        let mut s = Surface::with_content(markup);
        s.set_editable(true);
        s
    }

    #[test]
    fn test_parse_name_roundtrip() {
        for name in [
            "p",
            "h1",
            "h2",
            "h3",
            "h4",
            "h5",
            "h6",
            "blockquote",
            "pre",
            "bold",
            "italic",
            "underline",
            "insertorderedlist",
            "insertunorderedlist",
            "indent",
            "outdent",
            "createlink",
            "unlink",
            "insertimage",
            "inserthorizontalrule",
            "code",
        ] {
            let action = Action::parse(name).unwrap_or_else(|| panic!("unparsed: {name}"));
            assert_eq!(action.name(), name);
        }
        assert_eq!(Action::parse("superscript"), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Action::Heading(2).label(), "H2");
        assert_eq!(Action::InlineCode.label(), "Code");
        assert_eq!(Action::CreateLink.label(), "Link");
    }

    #[test]
    fn test_strategy_classification() {
        assert_eq!(Action::Heading(2).strategy(), Strategy::Block);
        assert_eq!(Action::Bold.strategy(), Strategy::Inline);
        assert_eq!(Action::OrderedList.strategy(), Strategy::Inline);
        assert_eq!(Action::CreateLink.strategy(), Strategy::Source);
        assert_eq!(Action::HorizontalRule.strategy(), Strategy::Insert);
        assert_eq!(Action::InlineCode.strategy(), Strategy::Wrap);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("  http://x.com "), "http://x.com");
        assert_eq!(normalize_url("x.com/page"), "http://x.com/page");
        assert_eq!(normalize_url("someone@example.com"), "mailto:someone@example.com");
        assert_eq!(normalize_url("mailto:a@b.co"), "mailto:a@b.co");
        assert_eq!(normalize_url("/local/path"), "/local/path");
        assert_eq!(normalize_url("   "), "");
        assert_eq!(normalize_url("ftp://files"), "ftp://files");
    }

    #[test]
    fn test_block_action_toggles_off_to_paragraph() {
        let mut s = editable("<p>Title</p>");
        s.select(Range::collapsed(Position::new(0, 2)));

        assert!(apply(&mut s, Action::Heading(2), None));
        assert_eq!(s.content_html(), "<h2>Title</h2>");

        // Same action again while inside an h2 reverts to a paragraph.
        assert!(apply(&mut s, Action::Heading(2), None));
        assert_eq!(s.content_html(), "<p>Title</p>");
    }

    #[test]
    fn test_blockquote_toggles_off_via_outdent() {
        let mut s = editable("<blockquote><blockquote>x</blockquote></blockquote>");
        s.select(Range::collapsed(Position::new(0, 0)));
        assert!(apply(&mut s, Action::Blockquote, None));
        // One level at a time, not straight to paragraph.
        assert_eq!(s.content_html(), "<blockquote>x</blockquote>");
    }

    #[test]
    fn test_createlink_empty_value_unlinks() {
        let mut s = editable("<p><a href=\"http://x\">word</a></p>");
        s.select(Range::collapsed(Position::new(0, 2)));
        assert!(apply(&mut s, Action::CreateLink, Some("   ")));
        assert_eq!(s.content_html(), "<p>word</p>");
    }

    #[test]
    fn test_createlink_normalizes_value() {
        let mut s = editable("<p>mail me</p>");
        s.select(Range::new(Position::new(0, 0), Position::new(0, 4)));
        assert!(apply(&mut s, Action::CreateLink, Some("  foo@bar.com  ")));
        assert_eq!(
            s.content_html(),
            "<p><a href=\"mailto:foo@bar.com\">mail</a> me</p>"
        );
    }

    #[test]
    fn test_horizontal_rule_lands_after_block() {
        let mut s = editable("<p>abcd</p><p>tail</p>");
        s.select(Range::collapsed(Position::new(0, 1)));
        assert!(apply(&mut s, Action::HorizontalRule, None));
        assert_eq!(s.content_html(), "<p>abcd</p><hr><p>tail</p>");
    }

    #[test]
    fn test_wrap_replaces_selection_with_code() {
        let mut s = editable("<p>use the force</p>");
        s.select(Range::new(Position::new(0, 4), Position::new(0, 7)));
        assert!(apply(&mut s, Action::InlineCode, None));
        assert_eq!(s.content_html(), "<p>use <code>the</code> force</p>");
    }

    #[test]
    fn test_wrap_requires_selection() {
        let mut s = editable("<p>x</p>");
        s.select(Range::collapsed(Position::new(0, 0)));
        assert!(!apply(&mut s, Action::InlineCode, None));
    }
}
