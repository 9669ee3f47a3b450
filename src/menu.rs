// Floating toolbar: which icons it carries, where it sits relative to the
// selection, and which icons light up for the current cursor position.

use log::warn;

use crate::action::Action;
use crate::document::BlockType;
use crate::host::{Ancestor, Point, Rect, Size};

/// Gap between the selection box and the toolbar.
pub const MENU_PADDING: f64 = 10.0;

const ICON_W: f64 = 24.0;
const MENU_H: f64 = 36.0;
// The caret never sits flush with the menu corner.
const CARET_MIN: f64 = 8.0;

/// The inline URL field shown in place of the icon row while a link is being
/// edited.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LinkInput {
    pub visible: bool,
    pub focused: bool,
    pub value: String,
}

#[derive(Debug)]
pub struct Menu {
    class: String,
    icons: Vec<Action>,
    visible: bool,
    position: Point,
    below: bool,
    active: Vec<&'static str>,
    link_input: LinkInput,
    // Which action the open URL field belongs to.
    pending: Option<Action>,
    caret_left: Option<f64>,
}

impl Menu {
    /// Build the toolbar from configured action names. Names that don't map
    /// to a known action are skipped with a warning, never an error.
    pub fn build(class: &str, names: &[String]) -> Menu {
        let mut icons = Vec::new();
        for name in names {
            match Action::parse(name) {
                Some(action) => icons.push(action),
                None => warn!("ignoring unknown toolbar action {name:?}"),
            }
        }
        Menu {
            class: class.to_string(),
            icons,
            visible: false,
            position: Point::default(),
            below: false,
            active: Vec::new(),
            link_input: LinkInput::default(),
            pending: None,
            caret_left: None,
        }
    }

    pub fn icons(&self) -> &[Action] {
        &self.icons
    }

    pub fn has_icon(&self, name: &str) -> bool {
        self.icons.iter().any(|a| a.name() == name)
    }

    pub fn has_link_input(&self) -> bool {
        self.has_icon("createlink") || self.has_icon("insertimage")
    }

    pub fn size(&self) -> Size {
        Size::new(self.icons.len() as f64 * ICON_W, MENU_H)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// True when the toolbar had to flip underneath the selection.
    pub fn is_below(&self) -> bool {
        self.below
    }

    /// Place the toolbar for a selection box, in viewport coordinates:
    /// centered above it, flipped below when it would leave the top edge,
    /// pinned to the left edge with the caret re-aimed when it would leave
    /// the left one.
    pub fn place(&mut self, selection: Rect, _viewport: Size) {
        let size = self.size();
        let mut top = selection.y - size.h - MENU_PADDING;
        self.below = top < 0.0;
        if self.below {
            top = selection.y + selection.h + MENU_PADDING;
        }

        let center = selection.x + selection.w / 2.0;
        let mut left = center - size.w / 2.0;
        if left < 0.0 {
            // Keep the caret pointing at the selection even though the menu
            // body can't follow it past the edge.
            self.caret_left = Some((size.w / 2.0 + left).max(CARET_MIN));
            left = 0.0;
        } else {
            self.caret_left = None;
        }

        self.position = Point::new(left, top);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.close_link_input();
    }

    /// The one style rule this instance owns, aiming the menu caret. Writing
    /// it replaces the previous rule wholesale.
    pub fn caret_rule(&self) -> String {
        match self.caret_left {
            Some(left) => format!(".{}-menu:after{{left:{left}px;}}", self.class),
            None => format!(".{}-menu:after{{left:50%;}}", self.class),
        }
    }

    /// Re-derive icon highlighting from the ancestor chain at the cursor.
    /// Also refreshes the link input value from the nearest enclosing link.
    pub fn highlight(&mut self, chain: &[Ancestor]) {
        self.active.clear();
        self.link_input.value.clear();
        for ancestor in chain {
            let name = match ancestor {
                Ancestor::Link(href) => {
                    self.link_input.value = href.clone();
                    "createlink"
                }
                Ancestor::Bold => "bold",
                Ancestor::Italic => "italic",
                Ancestor::Underline => "underline",
                Ancestor::Code => "code",
                Ancestor::OrderedList => "insertorderedlist",
                Ancestor::UnorderedList => "insertunorderedlist",
                // A list item lights the indent control.
                Ancestor::ListItem => "indent",
                Ancestor::Block(BlockType::Preformatted) => "code",
                Ancestor::Block(bt) => bt.tag(),
            };
            if self.has_icon(name) && !self.active.contains(&name) {
                self.active.push(name);
            }
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(&name)
    }

    pub fn active(&self) -> &[&'static str] {
        &self.active
    }

    pub fn link_input(&self) -> &LinkInput {
        &self.link_input
    }

    /// Swap the icon row for the URL field on behalf of `action`, pre-filled
    /// with the current link target when the cursor sits inside one.
    pub fn open_link_input(&mut self, action: Action) {
        if !self.has_link_input() {
            return;
        }
        self.pending = Some(action);
        self.link_input.visible = true;
        self.link_input.focused = true;
    }

    pub fn close_link_input(&mut self) {
        self.link_input.visible = false;
        self.link_input.focused = false;
        self.pending = None;
    }

    /// The action awaiting the URL field's value, if the field is open.
    pub fn pending_action(&self) -> Option<Action> {
        self.pending
    }

    pub fn set_link_value(&mut self, value: &str) {
        self.link_input.value = value.to_string();
    }

    pub fn blur_link_input(&mut self) {
        self.link_input.focused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_skips_unknown_actions() {
        let menu = Menu::build("nib", &names(&["bold", "sparkle", "italic"]));
        assert_eq!(menu.icons().len(), 2);
        assert!(menu.has_icon("bold"));
        assert!(!menu.has_icon("sparkle"));
        assert!(!menu.has_link_input());
    }

    #[test]
    fn test_place_above_and_centered() {
        let mut menu = Menu::build("nib", &names(&["bold", "italic"]));
        // 2 icons -> 48 wide; selection centered at x=100.
        menu.place(Rect::new(80.0, 200.0, 40.0, 18.0), Size::new(800.0, 600.0));
        assert!(menu.is_visible());
        assert!(!menu.is_below());
        assert_eq!(menu.position(), Point::new(76.0, 200.0 - 36.0 - MENU_PADDING));
        assert_eq!(menu.caret_rule(), ".nib-menu:after{left:50%;}");
    }

    #[test]
    fn test_place_flips_below_near_top() {
        let mut menu = Menu::build("nib", &names(&["bold"]));
        menu.place(Rect::new(100.0, 10.0, 40.0, 18.0), Size::new(800.0, 600.0));
        assert!(menu.is_below());
        assert_eq!(menu.position().y, 10.0 + 18.0 + MENU_PADDING);
    }

    #[test]
    fn test_place_pins_left_edge_and_aims_caret() {
        let mut menu = Menu::build(
            "nib",
            &names(&["bold", "italic", "underline", "createlink"]),
        );
        // 4 icons -> 96 wide; selection hugs the left edge.
        menu.place(Rect::new(0.0, 100.0, 16.0, 18.0), Size::new(800.0, 600.0));
        assert_eq!(menu.position().x, 0.0);
        // Caret points at the selection center (x=8), not the menu center.
        assert_eq!(menu.caret_rule(), ".nib-menu:after{left:8px;}");

        // Moving back toward the middle restores the centered caret.
        menu.place(Rect::new(300.0, 100.0, 16.0, 18.0), Size::new(800.0, 600.0));
        assert_eq!(menu.caret_rule(), ".nib-menu:after{left:50%;}");
    }

    #[test]
    fn test_highlight_from_ancestor_chain() {
        let mut menu = Menu::build(
            "nib",
            &names(&["bold", "italic", "h2", "indent", "insertunorderedlist", "createlink"]),
        );
        menu.highlight(&[
            Ancestor::Bold,
            Ancestor::Link("http://x".into()),
            Ancestor::ListItem,
            Ancestor::UnorderedList,
        ]);
        assert!(menu.is_active("bold"));
        assert!(menu.is_active("createlink"));
        assert!(menu.is_active("indent"));
        assert!(menu.is_active("insertunorderedlist"));
        assert!(!menu.is_active("italic"));
        assert_eq!(menu.link_input().value, "http://x");
    }

    #[test]
    fn test_highlight_ignores_missing_icons() {
        let mut menu = Menu::build("nib", &names(&["bold"]));
        menu.highlight(&[Ancestor::Block(BlockType::Heading { level: 2 })]);
        assert!(menu.active().is_empty());
    }

    #[test]
    fn test_preformatted_lights_code_icon() {
        let mut menu = Menu::build("nib", &names(&["code"]));
        menu.highlight(&[Ancestor::Block(BlockType::Preformatted)]);
        assert!(menu.is_active("code"));
    }

    #[test]
    fn test_link_input_lifecycle() {
        let mut menu = Menu::build("nib", &names(&["bold", "createlink"]));
        menu.open_link_input(Action::CreateLink);
        assert!(menu.link_input().visible);
        assert!(menu.link_input().focused);
        assert_eq!(menu.pending_action(), Some(Action::CreateLink));

        menu.hide();
        assert!(!menu.link_input().visible);
        assert!(!menu.link_input().focused);
        assert_eq!(menu.pending_action(), None);
    }
}
