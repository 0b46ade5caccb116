//! Interactive host loop

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use tracing::{debug, info};

use crate::surface::TerminalSurface;
use crate::system::{AsciiAnimationSystem, Control};
use crate::Result;

/// Longest we block in `poll` with nothing scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Drives an [`AsciiAnimationSystem`] on the real terminal until quit.
pub struct App {
    system: AsciiAnimationSystem<TerminalSurface>,
    should_quit: bool,
}

impl App {
    pub fn new(system: AsciiAnimationSystem<TerminalSurface>) -> Self {
        Self {
            system,
            should_quit: false,
        }
    }

    pub fn system(&self) -> &AsciiAnimationSystem<TerminalSurface> {
        &self.system
    }

    /// Run the main event loop
    pub async fn run(&mut self) -> Result<()> {
        // Drain anything queued during terminal setup.
        while event::poll(Duration::from_millis(0))? {
            let _ = event::read()?;
        }

        self.system.start();
        info!(theme = self.system.theme_info().name, "animation started");

        while !self.should_quit {
            let now = Instant::now();
            self.system.poll_deferred(now);
            self.system.frame(now)?;

            let now = Instant::now();
            let timeout = self
                .system
                .next_deadline(now)
                .map_or(IDLE_POLL, |deadline| deadline.saturating_duration_since(now))
                .min(IDLE_POLL);

            if event::poll(timeout)? {
                self.handle_event(event::read()?);
            }
            tokio::task::yield_now().await;
        }

        self.system.destroy();
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let now = Instant::now();
        match event {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Press
                    && key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    self.should_quit = true;
                    return;
                }
                if self.system.handle_key(key, now) == Control::Quit {
                    debug!("quit requested");
                    self.should_quit = true;
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    self.system.handle_pointer(Some((mouse.column, mouse.row)), now);
                }
                _ => {}
            },
            Event::Resize(width, height) => self.system.handle_resize(width, height, now),
            Event::FocusLost => {
                self.system.handle_pointer(None, now);
                self.system.handle_visibility(false);
            }
            Event::FocusGained => self.system.handle_visibility(true),
            _ => {}
        }
    }
}
