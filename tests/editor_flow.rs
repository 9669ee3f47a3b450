// End-to-end flows through the public editor API, driving a Surface host.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use insta::assert_snapshot;
use nib::editor::Event;
use nib::host::Point;
use nib::util::{DEFAULT_DELAY, KEY_DELAY};
use nib::{ConfigOverrides, Editor, Position, Range, Surface};

fn editor(markup: &str) -> Editor {
    Editor::new(Surface::with_content(markup), ConfigOverrides::default()).unwrap()
}

fn change_log(editor: &mut Editor) -> Rc<RefCell<Vec<(String, String)>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    editor.on_change(move |from, to| {
        sink.borrow_mut().push((from.to_string(), to.to_string()));
    });
    log
}

#[test]
fn test_bold_toggle_returns_to_canonical_bytes() {
    let mut editor = editor("<p>Hello world</p>");
    let original = editor.get_content();
    let changes = change_log(&mut editor);

    editor.set_range(Some(Range::new(Position::new(0, 0), Position::new(0, 5))));
    assert!(editor.exec("bold", None));
    assert_snapshot!(editor.get_content(), @"<p><b>Hello</b> world</p>");

    assert!(editor.exec("bold", None));
    assert_eq!(editor.get_content(), original, "byte-for-byte");
    assert_eq!(changes.borrow().len(), 2);

    // Same bytes as loading the text fresh through the sanitizer.
    let mut fresh = Editor::new(Surface::new(), ConfigOverrides::default()).unwrap();
    fresh.set_content("<p>Hello world</p>");
    assert_eq!(editor.get_content(), fresh.get_content());
}

#[test]
fn test_heading_toggle_reverts_to_paragraph() {
    let mut editor = editor("<p>Title</p>");
    editor.set_range(Some(Range::collapsed(Position::new(0, 1))));

    assert!(editor.exec("h2", None));
    assert_snapshot!(editor.get_content(), @"<h2>Title</h2>");

    assert!(editor.exec("h2", None));
    assert_snapshot!(editor.get_content(), @"<p>Title</p>");
}

#[test]
fn test_reapplying_active_format_stays_silent() {
    let mut editor = editor("<p>note</p>");
    let changes = change_log(&mut editor);
    editor.set_range(Some(Range::collapsed(Position::new(0, 2))));

    editor.exec("p", None);
    assert!(changes.borrow().is_empty(), "no net change, no notification");
}

#[test]
fn test_link_flow_through_menu() {
    let mut editor = editor("<p>send mail now</p>");
    editor.set_range(Some(Range::new(Position::new(0, 5), Position::new(0, 9))));

    let t0 = Instant::now();
    editor.dispatch(Event::MouseUp, t0);
    editor.run_pending(t0 + DEFAULT_DELAY);
    assert!(editor.menu().is_visible());

    // The link icon swaps in the URL field instead of running a command.
    editor.dispatch(Event::MenuClick("createlink".to_string()), t0);
    assert!(editor.menu().link_input().visible);
    assert_eq!(editor.get_content(), "<p>send mail now</p>");

    // Clicking into the field collapses the native selection; the menu must
    // survive that while the field has focus.
    editor
        .host_mut()
        .select(Range::collapsed(Position::new(0, 9)));
    editor.dispatch(Event::KeyUp, t0);
    editor.run_pending(t0 + KEY_DELAY);
    assert!(editor.menu().is_visible());

    editor.dispatch(Event::LinkSubmit("  foo@bar.com  ".to_string()), t0);
    assert_snapshot!(
        editor.get_content(),
        @r#"<p>send <a href="mailto:foo@bar.com">mail</a> now</p>"#
    );
    assert!(!editor.menu().link_input().visible);
}

#[test]
fn test_link_target_normalization() {
    for (typed, expected) in [
        ("example.com/a", "http://example.com/a"),
        ("  https://x.dev ", "https://x.dev"),
        ("me@host.org", "mailto:me@host.org"),
        ("/relative/doc", "/relative/doc"),
    ] {
        let mut editor = editor("<p>word</p>");
        editor.set_range(Some(Range::new(Position::new(0, 0), Position::new(0, 4))));
        assert!(editor.exec("createlink", Some(typed)));
        assert_eq!(
            editor.get_content(),
            format!("<p><a href=\"{expected}\">word</a></p>")
        );
    }
}

#[test]
fn test_image_flow_through_menu_input() {
    let mut editor = editor("<p>pic here</p>");
    editor.set_actions(&["bold".to_string(), "insertimage".to_string()]);
    editor.set_range(Some(Range::collapsed(Position::new(0, 4))));

    let t0 = Instant::now();
    editor.dispatch(Event::MenuClick("insertimage".to_string()), t0);
    assert!(editor.menu().link_input().visible);

    editor.dispatch(Event::LinkSubmit("cat.png".to_string()), t0);
    assert_snapshot!(
        editor.get_content(),
        @r#"<p>pic <img src="cat.png">here</p>"#
    );
}

#[test]
fn test_emptied_link_input_removes_link() {
    let mut editor = editor("<p><a href=\"http://x\">word</a></p>");
    editor.set_range(Some(Range::collapsed(Position::new(0, 2))));
    assert!(editor.exec("createlink", Some("")));
    assert_snapshot!(editor.get_content(), @"<p>word</p>");
}

#[test]
fn test_paste_cleanup_is_deferred() {
    let mut editor = editor("<p>start</p>");
    editor.focus_end();

    let t0 = Instant::now();
    editor.dispatch(
        Event::Paste("<h2 style=\"color:red\">loud</h2>".to_string()),
        t0,
    );
    // Raw paste lands first, dirt included.
    assert_snapshot!(
        editor.get_content(),
        @r#"<p>start</p><h2 style="color:red">loud</h2>"#
    );

    editor.run_pending(t0 + DEFAULT_DELAY);
    assert_snapshot!(editor.get_content(), @"<p>start</p><h2>loud</h2>");
}

#[test]
fn test_menu_flips_and_pins_at_edges() {
    let mut editor = editor("<p>a</p><p>b</p><p>c</p><p>hello world</p>");

    // First line: no headroom, menu flips below and pins to the left edge.
    editor.set_range(Some(Range::new(Position::new(0, 0), Position::new(0, 1))));
    let t0 = Instant::now();
    editor.dispatch(Event::MouseUp, t0);
    editor.run_pending(t0 + DEFAULT_DELAY);
    assert!(editor.menu().is_below());
    assert_eq!(editor.menu().position().x, 0.0);
    assert_snapshot!(editor.menu().caret_rule(), @".nib-menu:after{left:8px;}");

    // Fourth line has room above.
    editor.set_range(Some(Range::new(Position::new(3, 0), Position::new(3, 11))));
    editor.dispatch(Event::MouseUp, t0);
    editor.run_pending(t0 + DEFAULT_DELAY);
    assert!(!editor.menu().is_below());

    // Window changes re-place the visible menu instead of hiding it.
    editor.dispatch(Event::Resize, t0);
    assert!(editor.menu().is_visible());
}

#[test]
fn test_selection_highlighting_follows_cursor() {
    let mut editor = editor("<p>plain <b>bold</b> <a href=\"http://x\">link</a></p>");

    // "bold" spans offsets 6..10
    editor.set_range(Some(Range::new(Position::new(0, 6), Position::new(0, 10))));
    let t0 = Instant::now();
    editor.dispatch(Event::MouseUp, t0);
    editor.run_pending(t0 + DEFAULT_DELAY);
    assert!(editor.menu().is_active("bold"));
    assert!(!editor.menu().is_active("createlink"));

    // "link" spans offsets 11..15
    editor.set_range(Some(Range::new(Position::new(0, 11), Position::new(0, 15))));
    editor.dispatch(Event::MouseUp, t0);
    editor.run_pending(t0 + DEFAULT_DELAY);
    assert!(editor.menu().is_active("createlink"));
    assert_eq!(editor.menu().link_input().value, "http://x");
}

#[test]
fn test_placeholder_roundtrip() {
    let overrides = ConfigOverrides {
        placeholder: Some("Say something".to_string()),
        ..Default::default()
    };
    let mut editor = Editor::new(Surface::new(), overrides).unwrap();
    assert!(editor.placeholder_active());
    assert_eq!(editor.get_content(), "");

    let t0 = Instant::now();
    editor.dispatch(Event::Focus, t0);
    assert!(!editor.placeholder_active());

    editor.set_content("<p>typed</p>");
    editor.dispatch(Event::Blur, t0);
    assert!(!editor.placeholder_active());

    editor.set_content("");
    editor.dispatch(Event::Focus, t0);
    editor.dispatch(Event::Blur, t0);
    assert!(editor.placeholder_active());
}

#[test]
fn test_set_content_sanitizes() {
    let mut editor = editor("");
    editor.set_content("<p class=\"x\">keep</p><script>alert(1)</script>");
    assert_snapshot!(editor.get_content(), @"<p>keep</p>");
}

#[test]
fn test_outside_click_dismisses_menu_but_menu_click_does_not() {
    let mut editor = editor("<p>a</p><p>b</p><p>hello world</p>");
    editor.set_range(Some(Range::new(Position::new(2, 0), Position::new(2, 5))));
    let t0 = Instant::now();
    editor.dispatch(Event::MouseUp, t0);
    editor.run_pending(t0 + DEFAULT_DELAY);
    assert!(editor.menu().is_visible());

    let on_menu = editor.menu().position();
    editor.dispatch(Event::Click(Point::new(on_menu.x + 2.0, on_menu.y + 2.0)), t0);
    assert!(editor.menu().is_visible());

    editor.dispatch(Event::Click(Point::new(790.0, 590.0)), t0);
    assert!(!editor.menu().is_visible());
}

#[test]
fn test_default_toolbar_actions() {
    let editor = editor("<p>x</p>");
    assert_eq!(
        editor.actions(),
        vec![
            "blockquote",
            "h2",
            "h3",
            "p",
            "code",
            "insertorderedlist",
            "insertunorderedlist",
            "inserthorizontalrule",
            "indent",
            "outdent",
            "bold",
            "italic",
            "underline",
            "createlink",
        ]
    );
}
