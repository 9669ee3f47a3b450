// The editor: wires selection tracking, the floating toolbar, and content
// hygiene together over a host.

use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

use crate::action::{self, Action};
use crate::config::{ConfigError, ConfigOverrides, EditorConfig};
use crate::document::{Block, Position};
use crate::host::{Host, NativeCommand, Point, Rect};
use crate::html;
use crate::menu::Menu;
use crate::range::{Range, RangeTracker};
use crate::util::{Debouncer, ListenerRegistry, DEFAULT_DELAY, KEY_DELAY};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("container does not match configured selector {selector:?}")]
    TargetMismatch { selector: String },
}

/// Where an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Container,
    Menu,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    MouseUp,
    KeyUp,
    Focus,
    Blur,
    Paste,
    Click,
    Resize,
    Scroll,
    MenuClick,
    LinkSubmit,
}

/// An event delivered from the host environment.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MouseUp,
    KeyUp,
    Focus,
    Blur,
    Paste(String),
    /// A click anywhere on the page, in viewport coordinates.
    Click(Point),
    Resize,
    Scroll,
    /// A toolbar icon was pressed; carries the action name.
    MenuClick(String),
    /// The link input was submitted.
    LinkSubmit(String),
}

impl Event {
    fn target_kind(&self) -> (EventTarget, EventKind) {
        match self {
            Event::MouseUp => (EventTarget::Container, EventKind::MouseUp),
            Event::KeyUp => (EventTarget::Container, EventKind::KeyUp),
            Event::Focus => (EventTarget::Container, EventKind::Focus),
            Event::Blur => (EventTarget::Container, EventKind::Blur),
            Event::Paste(_) => (EventTarget::Container, EventKind::Paste),
            Event::Click(_) => (EventTarget::Window, EventKind::Click),
            Event::Resize => (EventTarget::Window, EventKind::Resize),
            Event::Scroll => (EventTarget::Window, EventKind::Scroll),
            Event::MenuClick(_) => (EventTarget::Menu, EventKind::MenuClick),
            Event::LinkSubmit(_) => (EventTarget::Menu, EventKind::LinkSubmit),
        }
    }
}

/// What a bound listener does when its event arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    ScheduleToggle(Duration),
    EnterEditing,
    LeaveEditing,
    PasteContent,
    OutsideClick,
    Reposition,
    MenuAction,
    SubmitLink,
}

type ChangeListener = Box<dyn FnMut(&str, &str)>;

pub struct Editor {
    host: Box<dyn Host>,
    config: EditorConfig,
    range: RangeTracker,
    menu: Menu,
    listeners: ListenerRegistry<EventTarget, EventKind, Handler>,
    toggle: Debouncer,
    cleanup: Debouncer,
    snapshot: String,
    change_listeners: Vec<ChangeListener>,
    placeholder_active: bool,
    owns_unload_guard: bool,
    destroyed: bool,
}

impl Editor {
    /// Attach an editor to a host container. Fails fast when the configured
    /// selector doesn't resolve to the container; everything downstream is
    /// non-fatal.
    pub fn new(host: impl Host + 'static, overrides: ConfigOverrides) -> Result<Editor, Error> {
        let mut host: Box<dyn Host> = Box::new(host);
        let config = overrides.resolve()?;

        if let Some(selector) = &config.selector
            && !host.matches_selector(selector)
        {
            return Err(Error::TargetMismatch {
                selector: selector.clone(),
            });
        }

        host.add_class(&config.class);
        host.set_editable(true);

        let owns_unload_guard = config.stay && !host.has_unload_guard();
        if owns_unload_guard {
            // Never clobber a guard the page installed itself.
            host.install_unload_guard();
        }

        let menu = Menu::build(&config.class, &config.actions);
        let snapshot = html::write(host.document());
        let placeholder_active = config.placeholder.is_some() && host.document().is_empty();

        let mut editor = Editor {
            range: RangeTracker::new(config.debug),
            menu,
            listeners: ListenerRegistry::new(),
            toggle: Debouncer::new(),
            cleanup: Debouncer::new(),
            snapshot,
            change_listeners: Vec::new(),
            placeholder_active,
            owns_unload_guard,
            destroyed: false,
            host,
            config,
        };
        editor.bind();
        if editor.config.debug {
            debug!("editor attached, {} toolbar icons", editor.menu.icons().len());
        }
        Ok(editor)
    }

    fn bind(&mut self) {
        let l = &mut self.listeners;
        l.add(
            EventTarget::Container,
            EventKind::MouseUp,
            Handler::ScheduleToggle(DEFAULT_DELAY),
        );
        l.add(
            EventTarget::Container,
            EventKind::KeyUp,
            Handler::ScheduleToggle(KEY_DELAY),
        );
        l.add(EventTarget::Container, EventKind::Focus, Handler::EnterEditing);
        l.add(EventTarget::Container, EventKind::Blur, Handler::LeaveEditing);
        l.add(EventTarget::Container, EventKind::Paste, Handler::PasteContent);
        l.add(EventTarget::Window, EventKind::Click, Handler::OutsideClick);
        l.add(EventTarget::Window, EventKind::Resize, Handler::Reposition);
        l.add(EventTarget::Window, EventKind::Scroll, Handler::Reposition);
        l.add(EventTarget::Menu, EventKind::MenuClick, Handler::MenuAction);
        l.add(EventTarget::Menu, EventKind::LinkSubmit, Handler::SubmitLink);
    }

    /// Deliver a host event. A destroyed editor swallows everything.
    pub fn dispatch(&mut self, event: Event, now: Instant) {
        if self.destroyed {
            return;
        }
        let (target, kind) = event.target_kind();
        let bound: Vec<Handler> = self.listeners.handlers(target, kind).copied().collect();
        for handler in bound {
            self.run(handler, &event, now);
        }
    }

    fn run(&mut self, handler: Handler, event: &Event, now: Instant) {
        match handler {
            Handler::ScheduleToggle(delay) => self.toggle.schedule(now, delay),
            Handler::EnterEditing => self.enter_editing(),
            Handler::LeaveEditing => self.leave_editing(),
            Handler::PasteContent => {
                if let Event::Paste(markup) = event {
                    self.paste(markup.clone(), now);
                }
            }
            Handler::OutsideClick => {
                if let Event::Click(point) = event {
                    self.outside_click(*point);
                }
            }
            Handler::Reposition => self.reposition(),
            Handler::MenuAction => {
                if let Event::MenuClick(name) = event {
                    self.menu_action(&name.clone());
                }
            }
            Handler::SubmitLink => {
                if let Event::LinkSubmit(value) = event {
                    self.submit_link(&value.clone());
                }
            }
        }
    }

    /// Run debounced work whose deadline has passed. The host calls this from
    /// its timer tick.
    pub fn run_pending(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        if self.toggle.fire(now) {
            self.evaluate_menu();
        }
        if self.cleanup.fire(now) {
            self.cleanup_content();
        }
    }

    /// Run all pending work immediately, deadlines notwithstanding.
    pub fn flush(&mut self) {
        if self.destroyed {
            return;
        }
        if self.toggle.is_pending() {
            self.toggle.cancel();
            self.evaluate_menu();
        }
        if self.cleanup.is_pending() {
            self.cleanup.cancel();
            self.cleanup_content();
        }
    }

    /// Re-derive menu visibility, placement, and highlighting from the
    /// current selection.
    fn evaluate_menu(&mut self) {
        let range = self.range.get_range(self.host.as_ref());

        if range.is_collapsed() {
            // Clicking into the link input collapses the native selection;
            // that alone must not take the menu away, and the remembered
            // range has to survive so the submitted link lands on it.
            let editing_link =
                self.menu.link_input().focused && self.config.link_input_keeps_menu;
            if !editing_link {
                self.range.remember(range);
                self.menu.hide();
            }
            return;
        }
        self.range.remember(range);

        let rect = self.host.range_rect(&range);
        self.menu.place(rect, self.host.viewport());
        if !self.menu.link_input().focused {
            self.menu.close_link_input();
        }
        // Probe just inside the selection; the start boundary itself resolves
        // to whatever precedes it.
        let start = range.normalized().start;
        let probe = self
            .host
            .clamp(Position::new(start.block, start.offset + 1));
        let chain = self.host.ancestors(probe);
        self.menu.highlight(&chain);
    }

    fn reposition(&mut self) {
        if !self.menu.is_visible() {
            return;
        }
        if let Some(range) = self.range.tracked() {
            let rect = self.host.range_rect(&range);
            self.menu.place(rect, self.host.viewport());
        }
    }

    fn menu_rect(&self) -> Rect {
        let pos = self.menu.position();
        let size = self.menu.size();
        Rect::new(pos.x, pos.y, size.w, size.h)
    }

    fn outside_click(&mut self, point: Point) {
        if !self.menu.is_visible() {
            return;
        }
        // Clicks on the menu or anywhere in the container keep the menu up;
        // the selection toggle handles those.
        if self.menu_rect().contains(point) || self.host.container_rect().contains(point) {
            return;
        }
        self.menu.hide();
        self.range.forget();
    }

    /// Run a toolbar action by name. Unknown names are logged and ignored.
    pub fn exec(&mut self, name: &str, value: Option<&str>) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(action) = Action::parse(name) else {
            warn!("ignoring unknown action {name:?}");
            return false;
        };

        // The toolbar steals focus; put the remembered selection back first.
        self.range.set_range(self.host.as_mut(), None);
        let applied = action::apply(self.host.as_mut(), action, value);

        // Indent levels are structure the cleaner would flatten.
        if !matches!(action, Action::Indent | Action::Outdent) {
            self.host.document_mut().sanitize(&self.config.policy);
        }
        self.check_change();
        self.evaluate_menu();
        applied
    }

    fn menu_action(&mut self, name: &str) {
        let Some(action) = Action::parse(name) else {
            warn!("ignoring unknown toolbar action {name:?}");
            return;
        };
        if action.wants_input() && !self.menu.link_input().visible {
            self.menu.open_link_input(action);
            return;
        }
        self.exec(name, None);
    }

    fn submit_link(&mut self, value: &str) {
        let action = self.menu.pending_action().unwrap_or(Action::CreateLink);
        self.menu.set_link_value(value);
        self.menu.close_link_input();
        self.exec(action.name(), Some(value));
    }

    fn enter_editing(&mut self) {
        if self.placeholder_active {
            self.placeholder_active = false;
        }
        // An empty container gets one paragraph so the caret has a home.
        if self.host.document().blocks().is_empty() {
            self.host.document_mut().add_block(Block::paragraph());
            self.range
                .set_range(self.host.as_mut(), Some(Range::collapsed(Position::start())));
        }
    }

    fn leave_editing(&mut self) {
        self.check_change();
        if self.config.placeholder.is_some() && self.host.document().is_empty() {
            self.placeholder_active = true;
        }
    }

    fn paste(&mut self, markup: String, now: Instant) {
        // Pasting targets the host's live caret; fall back to the remembered
        // range only when the host has no selection at all.
        if self.host.selection().is_none() {
            self.range.set_range(self.host.as_mut(), None);
        }
        self.host
            .exec(NativeCommand::InsertHtml, Some(&markup));
        // Cleaning synchronously would fight the host's own paste handling.
        self.cleanup.schedule(now, DEFAULT_DELAY);
        self.toggle.schedule(now, DEFAULT_DELAY);
    }

    fn cleanup_content(&mut self) {
        self.host.document_mut().sanitize(&self.config.policy);
        self.check_change();
    }

    /// Compare current content against the last snapshot and notify only on
    /// a net change, so a toggle round-trip stays silent.
    fn check_change(&mut self) {
        let current = html::write(self.host.document());
        if current != self.snapshot {
            let previous = std::mem::replace(&mut self.snapshot, current.clone());
            for listener in &mut self.change_listeners {
                listener(&current, &previous);
            }
        }
    }

    /// Register a change listener. It receives the new content followed by
    /// the previous content.
    pub fn on_change(&mut self, listener: impl FnMut(&str, &str) + 'static) {
        self.change_listeners.push(Box::new(listener));
    }

    /// Serialized content. The placeholder is presentation, never content.
    pub fn get_content(&self) -> String {
        html::write(self.host.document())
    }

    /// Replace content wholesale. Sets the change baseline silently.
    pub fn set_content(&mut self, markup: &str) {
        let mut doc = html::read(markup, &self.config.policy);
        doc.sanitize(&self.config.policy);
        *self.host.document_mut() = doc;
        self.snapshot = html::write(self.host.document());
        self.placeholder_active =
            self.config.placeholder.is_some() && self.host.document().is_empty();
        self.range.forget();
    }

    pub fn is_empty(&self) -> bool {
        self.host.document().is_empty()
    }

    pub fn placeholder_active(&self) -> bool {
        self.placeholder_active
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.config.placeholder.as_deref()
    }

    /// Change or remove the placeholder text at runtime.
    pub fn set_placeholder(&mut self, text: Option<&str>) {
        self.config.placeholder = text.map(str::to_string);
        self.placeholder_active =
            self.config.placeholder.is_some() && self.host.document().is_empty();
    }

    /// Move the caret to the very end of the content.
    pub fn focus_end(&mut self) {
        let end = self.host.content_end();
        self.range
            .set_range(self.host.as_mut(), Some(Range::collapsed(end)));
    }

    pub fn get_range(&self) -> Range {
        self.range.get_range(self.host.as_ref())
    }

    pub fn set_range(&mut self, range: Option<Range>) -> Range {
        self.range.set_range(self.host.as_mut(), range)
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn actions(&self) -> Vec<&'static str> {
        self.menu.icons().iter().map(|a| a.name()).collect()
    }

    /// Replace the toolbar action list. The menu is rebuilt hidden and shows
    /// again on the next selection.
    pub fn set_actions(&mut self, names: &[String]) {
        self.config.actions = names.to_vec();
        self.menu = Menu::build(&self.config.class, names);
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Mutable host access, for embedders relaying native state changes.
    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The message to show before the page unloads, when this editor is the
    /// one that asked for it.
    pub fn before_unload(&self) -> Option<&str> {
        if !self.destroyed && self.config.stay && self.owns_unload_guard {
            Some(&self.config.stay_msg)
        } else {
            None
        }
    }

    /// Tear the editor down: drop every listener, hide the menu, stop the
    /// timers, give the container back. Safe to call twice.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.listeners.clear();
        self.menu.hide();
        self.toggle.cancel();
        self.cleanup.cancel();
        self.range.forget();
        self.host.clear_selection();
        self.host.set_editable(false);
        self.destroyed = true;
        if self.config.debug {
            debug!("editor destroyed");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Bring a destroyed editor back to life on the same container.
    pub fn rebuild(&mut self) {
        if !self.destroyed {
            return;
        }
        self.destroyed = false;
        self.host.set_editable(true);
        self.bind();
        self.snapshot = html::write(self.host.document());
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.destroy();
    }
}
