//! Embeddable rich-text editing core with a floating formatting toolbar.
//!
//! The editor owns no rendering of its own: it drives a [`Host`], which
//! supplies content, selection, geometry, and the native formatting
//! commands. [`Surface`] is the built-in in-memory host; embedders over real
//! UI stacks implement the same trait.
//!
//! ```
//! use nib::{ConfigOverrides, Editor, Surface};
//!
//! let mut editor = Editor::new(
//!     Surface::with_content("<p>hello</p>"),
//!     ConfigOverrides::default(),
//! )?;
//! editor.exec("bold", None);
//! # Ok::<(), nib::Error>(())
//! ```

pub mod action;
pub mod config;
pub mod document;
pub mod editor;
pub mod host;
pub mod html;
pub mod menu;
pub mod range;
pub mod util;

pub use action::{Action, Strategy};
pub use config::{ConfigOverrides, EditorConfig};
pub use document::{Document, Position, SanitizePolicy};
pub use editor::{Editor, Error, Event};
pub use host::{Ancestor, Host, NativeCommand, Surface};
pub use menu::Menu;
pub use range::Range;
