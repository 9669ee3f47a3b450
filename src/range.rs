// Selection tracking over the host's single selection object.

use crate::document::Position;
use crate::host::Host;
use log::debug;

/// A selection range over the container's content. `start` and `end` are in
/// document order only after [`Range::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn collapsed(pos: Position) -> Self {
        Range::new(pos, pos)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The same range with `start <= end`.
    pub fn normalized(self) -> Self {
        if self.end < self.start {
            Range::new(self.end, self.start)
        } else {
            self
        }
    }

    pub fn collapse_to_end(self) -> Self {
        Range::collapsed(self.normalized().end)
    }
}

/// Wraps the host selection: the editor reads and writes the selection only
/// through this, so tests can supply a host with scripted behavior.
#[derive(Debug, Default)]
pub struct RangeTracker {
    tracked: Option<Range>,
    debug: bool,
}

impl RangeTracker {
    pub fn new(debug: bool) -> Self {
        RangeTracker {
            tracked: None,
            debug,
        }
    }

    /// The last range this editor observed, if any.
    pub fn tracked(&self) -> Option<Range> {
        self.tracked
    }

    pub fn remember(&mut self, range: Range) {
        self.tracked = Some(range);
    }

    pub fn forget(&mut self) {
        self.tracked = None;
    }

    /// The host's current range, confined to the container. Falls back to a
    /// range collapsed at the end of content, never one outside the container.
    pub fn get_range(&self, host: &dyn Host) -> Range {
        match host.selection() {
            Some(range) => Range::new(host.clamp(range.start), host.clamp(range.end)),
            None => Range::collapsed(host.content_end()),
        }
    }

    /// Replace the host selection with `range`, the last-tracked range, or a
    /// range collapsed at the end of content, in that order. A host that
    /// rejects the range is tolerated; the failure is only ever logged.
    pub fn set_range(&mut self, host: &mut dyn Host, range: Option<Range>) -> Range {
        let wanted = range
            .or(self.tracked)
            .unwrap_or_else(|| Range::collapsed(host.content_end()));
        let confined = Range::new(host.clamp(wanted.start), host.clamp(wanted.end));
        if !host.select(confined) && self.debug {
            debug!("host rejected selection {:?}", confined);
        }
        self.tracked = Some(confined);
        confined
    }

    pub fn is_collapsed(&self, host: &dyn Host) -> bool {
        self.get_range(host).is_collapsed()
    }
}
