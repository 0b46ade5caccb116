//! Where frames end up.
//!
//! A [`Surface`] hands out its size, accepts finished frames and grants
//! input capabilities (mouse reporting, focus reporting) that listeners hold
//! for as long as they are registered.

use std::cell::RefCell;
use std::io::{self, Stdout};
use std::rc::Rc;

use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, buffer::Buffer, layout::Rect, Terminal};
use tracing::debug;

/// Input the host only reports while someone holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Mouse move reporting
    PointerEvents,
    /// Focus gained/lost reporting
    FocusEvents,
}

pub trait Surface {
    /// Current drawable area. An error or an empty rect means there is no
    /// canvas to draw on.
    fn area(&mut self) -> io::Result<Rect>;

    /// Show a finished frame.
    fn present(&mut self, canvas: &Buffer) -> io::Result<()>;

    fn acquire(&mut self, capability: Capability) -> io::Result<()>;

    fn release(&mut self, capability: Capability) -> io::Result<()>;
}

/// The real terminal: raw mode plus the alternate screen for as long as it
/// lives.
pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    held: Vec<Capability>,
}

impl TerminalSurface {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(Self {
            terminal,
            held: Vec::new(),
        })
    }
}

impl Surface for TerminalSurface {
    fn area(&mut self) -> io::Result<Rect> {
        let size = self.terminal.size()?;
        Ok(Rect::new(0, 0, size.width, size.height))
    }

    fn present(&mut self, canvas: &Buffer) -> io::Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area().intersection(canvas.area);
            let buf = frame.buffer_mut();
            for y in area.top()..area.bottom() {
                for x in area.left()..area.right() {
                    if let (Some(dst), Some(src)) = (buf.cell_mut((x, y)), canvas.cell((x, y))) {
                        *dst = src.clone();
                    }
                }
            }
        })?;
        Ok(())
    }

    fn acquire(&mut self, capability: Capability) -> io::Result<()> {
        let backend = self.terminal.backend_mut();
        match capability {
            Capability::PointerEvents => execute!(backend, EnableMouseCapture)?,
            Capability::FocusEvents => execute!(backend, EnableFocusChange)?,
        }
        self.held.push(capability);
        debug!(?capability, "terminal capability acquired");
        Ok(())
    }

    fn release(&mut self, capability: Capability) -> io::Result<()> {
        let backend = self.terminal.backend_mut();
        match capability {
            Capability::PointerEvents => execute!(backend, DisableMouseCapture)?,
            Capability::FocusEvents => execute!(backend, DisableFocusChange)?,
        }
        self.held.retain(|held| *held != capability);
        debug!(?capability, "terminal capability released");
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        for capability in std::mem::take(&mut self.held).into_iter().rev() {
            let _ = self.release(capability);
        }
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// One grant or release seen by a [`HeadlessSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityEvent {
    Acquired(Capability),
    Released(Capability),
}

/// Shared record of capability traffic. Clones see the same log, so it
/// outlives a surface that was moved away and dropped.
#[derive(Debug, Clone, Default)]
pub struct CapabilityLog {
    events: Rc<RefCell<Vec<CapabilityEvent>>>,
}

impl CapabilityLog {
    pub fn events(&self) -> Vec<CapabilityEvent> {
        self.events.borrow().clone()
    }

    /// Capabilities acquired and not released since, in acquisition order.
    pub fn outstanding(&self) -> Vec<Capability> {
        let mut held = Vec::new();
        for event in self.events.borrow().iter() {
            match *event {
                CapabilityEvent::Acquired(c) => held.push(c),
                CapabilityEvent::Released(c) => held.retain(|h| *h != c),
            }
        }
        held
    }

    fn push(&self, event: CapabilityEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// In-memory surface for tests and `--headless` runs.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    width: u16,
    height: u16,
    broken: bool,
    refused: Vec<Capability>,
    held: Vec<Capability>,
    log: CapabilityLog,
    last: Option<Buffer>,
    presents: u64,
}

impl HeadlessSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// A surface whose size query fails outright.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Refuse to grant `capability`.
    pub fn refusing(mut self, capability: Capability) -> Self {
        self.refused.push(capability);
        self
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Capabilities currently granted, in acquisition order.
    pub fn held(&self) -> &[Capability] {
        &self.held
    }

    /// Handle on every acquire/release this surface sees from now on.
    pub fn capability_log(&self) -> CapabilityLog {
        self.log.clone()
    }

    pub fn last_frame(&self) -> Option<&Buffer> {
        self.last.as_ref()
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// The last presented frame as plain text, one line per row, with
    /// trailing spaces trimmed.
    pub fn text(&self) -> String {
        let Some(buf) = &self.last else {
            return String::new();
        };
        let area = buf.area;
        let mut lines = Vec::with_capacity(area.height as usize);
        for y in area.top()..area.bottom() {
            let mut line = String::new();
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell((x, y)) {
                    line.push_str(cell.symbol());
                }
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }
}

impl Surface for HeadlessSurface {
    fn area(&mut self) -> io::Result<Rect> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no canvas attached"));
        }
        Ok(Rect::new(0, 0, self.width, self.height))
    }

    fn present(&mut self, canvas: &Buffer) -> io::Result<()> {
        self.last = Some(canvas.clone());
        self.presents += 1;
        Ok(())
    }

    fn acquire(&mut self, capability: Capability) -> io::Result<()> {
        if self.refused.contains(&capability) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{:?} not supported", capability),
            ));
        }
        self.held.push(capability);
        self.log.push(CapabilityEvent::Acquired(capability));
        Ok(())
    }

    fn release(&mut self, capability: Capability) -> io::Result<()> {
        self.held.retain(|held| *held != capability);
        self.log.push(CapabilityEvent::Released(capability));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_tracks_capabilities() {
        let mut surface = HeadlessSurface::new(10, 4);
        surface.acquire(Capability::PointerEvents).unwrap();
        surface.acquire(Capability::FocusEvents).unwrap();
        assert_eq!(surface.held().len(), 2);
        surface.release(Capability::PointerEvents).unwrap();
        assert_eq!(surface.held(), &[Capability::FocusEvents]);
    }

    #[test]
    fn test_capability_log_outlives_surface() {
        let log = {
            let mut surface = HeadlessSurface::new(10, 4);
            let log = surface.capability_log();
            surface.acquire(Capability::PointerEvents).unwrap();
            surface.acquire(Capability::FocusEvents).unwrap();
            surface.release(Capability::FocusEvents).unwrap();
            log
        };
        assert_eq!(
            log.events(),
            vec![
                CapabilityEvent::Acquired(Capability::PointerEvents),
                CapabilityEvent::Acquired(Capability::FocusEvents),
                CapabilityEvent::Released(Capability::FocusEvents),
            ]
        );
        assert_eq!(log.outstanding(), vec![Capability::PointerEvents]);
    }

    #[test]
    fn test_headless_refusal_and_broken() {
        let mut surface = HeadlessSurface::new(10, 4).refusing(Capability::FocusEvents);
        assert!(surface.acquire(Capability::FocusEvents).is_err());
        assert!(surface.held().is_empty());
        assert!(HeadlessSurface::broken().area().is_err());
    }

    #[test]
    fn test_headless_text() {
        let mut surface = HeadlessSurface::new(4, 2);
        assert_eq!(surface.text(), "");
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 2));
        buf.set_string(1, 0, "ab", ratatui::style::Style::default());
        surface.present(&buf).unwrap();
        assert_eq!(surface.text(), " ab\n");
        assert_eq!(surface.presents(), 1);
    }
}
