//! The orchestrator.
//!
//! [`AsciiAnimationSystem`] owns the surface, the scheduler, the particle and
//! effect systems and the keyboard layer. The host loop feeds it events and
//! calls [`AsciiAnimationSystem::frame`]; everything else happens inside
//! scheduler tasks over the shared [`Stage`].

use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use ratatui::{buffer::Buffer, layout::Rect, style::Style, widgets::Widget};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::device::{DeviceSignals, FrameBudget, MemoryWatchdog};
use crate::effects::{EffectKind, EffectSelection, EffectSystem};
use crate::listeners::{ListenerId, ListenerKind, ListenerRegistry};
use crate::particles::{GlyphMetrics, ParticleSystem};
use crate::scheduler::{AnimationScheduler, FrameInfo, TaskId, TaskStatus};
use crate::surface::Surface;
use crate::theme::{Palette, ThemeInfo, ThemeStore};
use crate::timing::{Debounce, Throttle};
use crate::tui::{HelpBar, StatusBar};
use crate::vim::{Command, Intent, Mode, ThemeTarget, VimAction, VimSystem};
use crate::{AsciiscapeError, Config, Result};

/// Rows under the art taken by the help and status bars.
pub const STATUS_ROWS: u16 = 2;

/// Frames between memory-pressure polls.
const WATCHDOG_EVERY: u64 = 30;

/// Dispose listener registrations newest first. Returns how many were live.
fn dispose_listeners<S: Surface>(
    registry: &mut ListenerRegistry,
    surface: &mut S,
    ids: Vec<ListenerId>,
) -> usize {
    ids.into_iter()
        .rev()
        .filter(|id| registry.dispose(surface, *id))
        .count()
}

const LISTENERS: [ListenerKind; 4] = [
    ListenerKind::Resize,
    ListenerKind::Keys,
    ListenerKind::Pointer,
    ListenerKind::Visibility,
];

/// What the host loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Default)]
struct StatusState {
    visible: bool,
    mode: Mode,
    command_line: String,
    message: Option<String>,
    paused: bool,
}

/// The state frame tasks run against.
pub struct Stage {
    particles: ParticleSystem,
    effects: EffectSystem,
    canvas: Buffer,
    time: f32,
    status: StatusState,
}

impl Stage {
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn effects(&self) -> &EffectSystem {
        &self.effects
    }

    pub fn canvas(&self) -> &Buffer {
        &self.canvas
    }

    /// Frames drawn so far.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn message(&self) -> Option<&str> {
        self.status.message.as_deref()
    }

    /// Part of the canvas the art is laid out in.
    fn art_area(area: Rect, with_status: bool) -> Rect {
        if with_status && area.height > STATUS_ROWS {
            Rect {
                height: area.height - STATUS_ROWS,
                ..area
            }
        } else {
            area
        }
    }

    /// One frame: clear, apply the active effect to every particle, draw.
    fn render_frame(&mut self) {
        let palette = self.effects.document().palette();
        self.canvas.reset();
        self.canvas
            .set_style(self.canvas.area, Style::default().bg(palette.background));

        self.effects.begin_frame(self.time);
        for particle in self.particles.particles_mut() {
            self.effects.apply_effect_to_particle(particle, self.time);
        }
        self.particles.render_particles(&mut self.canvas, &palette);

        if self.status.visible {
            self.render_status(palette);
        }
        self.time += 1.0;
    }

    fn render_status(&mut self, palette: Palette) {
        let area = self.canvas.area;
        if area.height <= STATUS_ROWS {
            return;
        }
        let help = Rect::new(area.x, area.bottom() - 2, area.width, 1);
        let line = Rect::new(area.x, area.bottom() - 1, area.width, 1);
        for y in help.y..=line.y {
            for x in area.left()..area.right() {
                if let Some(cell) = self.canvas.cell_mut((x, y)) {
                    cell.reset();
                }
            }
        }

        HelpBar { palette }.render(help, &mut self.canvas);
        let kind = self.effects.current_kind();
        StatusBar {
            palette,
            mode: self.status.mode,
            command_line: &self.status.command_line,
            message: self.status.message.as_deref(),
            theme_name: kind.display_name(),
            theme_index: self.effects.current_index(),
            theme_count: self.effects.effect_count(),
            paused: self.status.paused,
            transitioning: self.effects.document().is_transitioning(),
        }
        .render(line, &mut self.canvas);
    }
}

pub struct AsciiAnimationSystem<S: Surface> {
    surface: S,
    stage: Stage,
    scheduler: AnimationScheduler<Stage>,
    vim: VimSystem,
    listeners: ListenerRegistry,
    /// Disposers for everything registered in `new`, oldest first
    listener_ids: Vec<ListenerId>,
    store: Box<dyn ThemeStore>,
    device: Box<dyn DeviceSignals>,
    budget: FrameBudget,
    watchdog: MemoryWatchdog,
    transition: Duration,
    pointer: Throttle,
    resize: Debounce<Rect>,
    theme_tx: Option<watch::Sender<ThemeInfo>>,
    tick_task: Option<TaskId>,
    transition_task: Option<TaskId>,
    last_frame: Option<Instant>,
    started: bool,
    paused: bool,
    hidden: bool,
    destroyed: bool,
}

impl<S: Surface> AsciiAnimationSystem<S> {
    /// Acquire the canvas and wire everything up. Nothing animates until
    /// [`start`](Self::start).
    ///
    /// Fails with [`AsciiscapeError::CanvasUnavailable`] when the surface has
    /// no usable area. If a listener cannot be registered, the ones already
    /// registered are disposed before the error is returned.
    pub fn new(
        mut surface: S,
        config: Config,
        device: Box<dyn DeviceSignals>,
        store: Box<dyn ThemeStore>,
    ) -> Result<Self> {
        let area = surface
            .area()
            .map_err(|e| AsciiscapeError::CanvasUnavailable(e.to_string()))?;
        if area.is_empty() {
            return Err(AsciiscapeError::CanvasUnavailable(format!(
                "surface is {}x{}",
                area.width, area.height
            )));
        }

        let mut effects = EffectSystem::new();
        let restored = store.load_index().unwrap_or(0);
        let theme = effects.set_current_effect(EffectSelection::Index(restored));
        debug!(theme = theme.name, index = theme.index, "theme restored");

        let mut particles = ParticleSystem::new(
            Stage::art_area(area, config.show_status),
            GlyphMetrics::default(),
            config.seed,
        );
        particles.create_particles(None);

        let mut listeners = ListenerRegistry::new();
        let mut listener_ids = Vec::with_capacity(LISTENERS.len());
        for kind in LISTENERS {
            match listeners.register(&mut surface, kind) {
                Ok(id) => listener_ids.push(id),
                Err(e) => {
                    let disposed = dispose_listeners(&mut listeners, &mut surface, listener_ids);
                    warn!(?kind, disposed, "listener registration failed: {}", e);
                    return Err(e);
                }
            }
        }

        let budget = FrameBudget::from_signals(device.as_ref(), config.fps);
        let (theme_tx, _) = watch::channel(theme);

        info!(
            width = area.width,
            height = area.height,
            particles = particles.len(),
            fps = budget.fps,
            "animation system ready"
        );

        Ok(Self {
            surface,
            stage: Stage {
                particles,
                effects,
                canvas: Buffer::empty(area),
                time: 0.0,
                status: StatusState {
                    visible: config.show_status,
                    ..StatusState::default()
                },
            },
            scheduler: AnimationScheduler::new(),
            vim: VimSystem::new(config.sequence_timeout()),
            listeners,
            listener_ids,
            store,
            device,
            budget,
            watchdog: MemoryWatchdog::new(budget.watchdog, WATCHDOG_EVERY),
            transition: config.transition(),
            pointer: Throttle::new(config.pointer_throttle()),
            resize: Debounce::new(config.resize_debounce()),
            theme_tx: Some(theme_tx),
            tick_task: None,
            transition_task: None,
            last_frame: None,
            started: false,
            paused: false,
            hidden: false,
            destroyed: false,
        })
    }

    /// Register the frame task.
    pub fn start(&mut self) {
        if self.destroyed {
            warn!("start called on a destroyed animation system");
            return;
        }
        self.started = true;
        self.sync_tick();
    }

    /// Stop drawing frames, keeping all state.
    pub fn pause(&mut self) {
        if self.destroyed {
            return;
        }
        self.paused = true;
        self.sync_tick();
    }

    pub fn resume(&mut self) {
        if self.destroyed {
            return;
        }
        self.paused = false;
        self.sync_tick();
    }

    /// Tear down: listeners newest first, then the scheduler and the
    /// particles. The theme channel closes. Calling it again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let ids = std::mem::take(&mut self.listener_ids);
        let disposed = dispose_listeners(&mut self.listeners, &mut self.surface, ids);
        self.scheduler.destroy();
        self.tick_task = None;
        self.transition_task = None;
        self.stage.particles.clear();
        self.resize.cancel();
        self.theme_tx = None;
        self.destroyed = true;
        debug!(listeners = disposed, "animation system destroyed");
    }

    /// The frame task should be registered exactly while started, not
    /// paused, visible and alive.
    fn sync_tick(&mut self) {
        let should_run = self.started && !self.paused && !self.hidden && !self.destroyed;
        match (should_run, self.tick_task) {
            (true, None) => {
                let id = self.scheduler.add("frame", |stage: &mut Stage, _: FrameInfo| {
                    stage.render_frame();
                    Ok(TaskStatus::Continue)
                });
                self.tick_task = Some(id);
                debug!("frame task registered");
            }
            (false, Some(id)) => {
                self.scheduler.remove(id);
                self.tick_task = None;
                debug!("frame task unregistered");
            }
            _ => {}
        }
        self.stage.status.paused = self.paused || self.hidden;
        self.refresh_status();
    }

    /// While no frame task is drawing, redraw just the status rows over the
    /// last frame so mode, typed commands and the paused badge still show.
    fn refresh_status(&mut self) {
        let idle = self.started && !self.destroyed && self.tick_task.is_none();
        if !idle || !self.stage.status.visible {
            return;
        }
        let palette = self.stage.effects.document().palette();
        self.stage.render_status(palette);
        if let Err(e) = self.surface.present(&self.stage.canvas) {
            warn!("failed to present status line: {}", e);
        }
    }

    /// Run a frame if one is requested and due, then present it. Returns
    /// whether a frame ran.
    pub fn frame(&mut self, now: Instant) -> Result<bool> {
        if self.destroyed || !self.scheduler.has_pending_frame() {
            return Ok(false);
        }
        if let Some(last) = self.last_frame {
            if now < last + self.budget.interval() {
                return Ok(false);
            }
        }

        self.scheduler.tick(&mut self.stage, now);
        self.last_frame = Some(now);
        self.surface.present(&self.stage.canvas)?;

        if self.watchdog.check(self.device.as_ref()) {
            warn!("memory pressure reported, pausing animation");
            self.stage.status.message = Some("paused: memory pressure".to_string());
            self.pause();
        }
        Ok(true)
    }

    /// When the host should call back next, if anything is scheduled.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let frame = self
            .scheduler
            .has_pending_frame()
            .then(|| self.last_frame.map_or(now, |last| last + self.budget.interval()));
        [frame, self.resize.deadline()].into_iter().flatten().min()
    }

    /// Apply deferred work whose time has come (the debounced resize).
    pub fn poll_deferred(&mut self, now: Instant) {
        if let Some(area) = self.resize.take_ready(now) {
            self.apply_resize(area);
        }
    }

    fn apply_resize(&mut self, area: Rect) {
        if area.is_empty() {
            debug!("ignoring resize to an empty area");
            return;
        }
        self.stage.canvas = Buffer::empty(area);
        self.stage
            .particles
            .resize(Stage::art_area(area, self.stage.status.visible));
        debug!(width = area.width, height = area.height, "canvas resized");
    }

    pub fn handle_resize(&mut self, width: u16, height: u16, now: Instant) {
        if !self.listeners.is_registered(ListenerKind::Resize) {
            return;
        }
        self.resize.push(Rect::new(0, 0, width, height), now);
    }

    /// Pointer moved to a cell, or left the canvas (`None`). Moves are
    /// throttled; leaving always applies.
    pub fn handle_pointer(&mut self, position: Option<(u16, u16)>, now: Instant) {
        if !self.listeners.is_registered(ListenerKind::Pointer) {
            return;
        }
        match position {
            None => {
                self.pointer.reset();
                self.stage.effects.set_mouse_position(None);
            }
            Some((col, row)) => {
                if !self.pointer.ready(now) {
                    return;
                }
                let y = row as f32 + self.stage.particles.scroll_y();
                self.stage.effects.set_mouse_position(Some((col as f32, y)));
            }
        }
    }

    /// Focus lost pauses the loop; focus gained resumes it unless paused
    /// explicitly.
    pub fn handle_visibility(&mut self, visible: bool) {
        if !self.listeners.is_registered(ListenerKind::Visibility) {
            return;
        }
        self.hidden = !visible;
        self.sync_tick();
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        if !self.listeners.is_registered(ListenerKind::Keys) {
            return Control::Continue;
        }

        let mut control = Control::Continue;
        match self.vim.handle_key_at(key, now) {
            VimAction::None => {}
            VimAction::ModeChanged(_) => self.stage.status.message = None,
            VimAction::Intent(intent) => self.apply_intent(intent, now),
            VimAction::Command(command) => control = self.run_command(command, now),
            VimAction::UnknownCommand(line) => {
                debug!(command = %line, "unknown command");
                self.stage.status.message = Some(format!("Not an editor command: {}", line));
            }
        }

        let mode = self.vim.mode();
        self.stage.effects.set_current_mode(mode);
        self.stage.status.mode = mode;
        self.stage.status.command_line = self.vim.command_line().to_string();
        self.refresh_status();
        control
    }

    fn apply_intent(&mut self, intent: Intent, now: Instant) {
        match intent {
            Intent::ScrollDown => self.stage.particles.scroll_by(1.0),
            Intent::ScrollUp => self.stage.particles.scroll_by(-1.0),
            Intent::JumpToTop => self.stage.particles.scroll_to_top(),
            Intent::JumpToBottom => self.stage.particles.scroll_to_bottom(),
            Intent::NextTheme => {
                self.switch_theme(EffectSelection::Next, now);
            }
            Intent::PreviousTheme => {
                self.switch_theme(EffectSelection::Previous, now);
            }
        }
    }

    fn run_command(&mut self, command: Command, now: Instant) -> Control {
        self.stage.status.message = None;
        match command {
            Command::Quit => return Control::Quit,
            Command::Theme(ThemeTarget::Index(n)) => {
                // Themes are numbered from 1 on the command line.
                self.switch_theme(EffectSelection::Index(n.saturating_sub(1)), now);
            }
            Command::Theme(ThemeTarget::Name(name)) => {
                match EffectKind::from_name(&name).and_then(|k| self.stage.effects.index_of(k)) {
                    Some(index) => {
                        self.switch_theme(EffectSelection::Index(index), now);
                    }
                    None => self.stage.status.message = Some(format!("Unknown theme: {}", name)),
                }
            }
            Command::NextTheme => {
                self.switch_theme(EffectSelection::Next, now);
            }
            Command::PreviousTheme => {
                self.switch_theme(EffectSelection::Previous, now);
            }
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
        }
        Control::Continue
    }

    /// Switch theme: raise the transition marker, change the effect, reset
    /// the particles, persist and publish, and schedule the marker's removal.
    pub fn switch_theme(&mut self, selection: EffectSelection, now: Instant) -> ThemeInfo {
        self.stage.effects.document_mut().set_transitioning(true);
        let theme = self.stage.effects.set_current_effect(selection);
        self.stage.particles.reset_particles();

        if let Err(e) = self.store.save(theme.index, theme.tone) {
            warn!(theme = theme.name, "failed to persist theme: {}", e);
        }
        if let Some(tx) = &self.theme_tx {
            tx.send_replace(theme);
        }

        if let Some(id) = self.transition_task.take() {
            self.scheduler.remove(id);
        }
        let until = now + self.transition;
        let id = self
            .scheduler
            .add("theme-transition", move |stage: &mut Stage, frame: FrameInfo| {
                if frame.now < until {
                    return Ok(TaskStatus::Continue);
                }
                stage.effects.document_mut().set_transitioning(false);
                Ok(TaskStatus::Stop)
            });
        self.transition_task = Some(id);

        info!(theme = theme.name, index = theme.index, tone = theme.tone.as_str(), "theme switched");
        theme
    }

    /// Follow theme changes. After `destroy` the receiver is already closed.
    pub fn subscribe_theme(&self) -> watch::Receiver<ThemeInfo> {
        match &self.theme_tx {
            Some(tx) => tx.subscribe(),
            None => watch::channel(self.theme_info()).1,
        }
    }

    pub fn theme_info(&self) -> ThemeInfo {
        self.stage.effects.theme_info()
    }

    pub fn mode(&self) -> Mode {
        self.vim.mode()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn scheduler(&self) -> &AnimationScheduler<Stage> {
        &self.scheduler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn budget(&self) -> FrameBudget {
        self.budget
    }

    /// Whether the frame task is registered and alive.
    pub fn is_running(&self) -> bool {
        self.tick_task.is_some_and(|id| self.scheduler.contains(id))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<S: Surface> Drop for AsciiAnimationSystem<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{PerformanceTier, StaticSignals};
    use crate::surface::{Capability, CapabilityEvent, HeadlessSurface};
    use crate::theme::{MemoryThemeStore, Tone};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn config() -> Config {
        Config::default().with_seed(1).with_fps(1000)
    }

    fn engine(store: MemoryThemeStore) -> AsciiAnimationSystem<HeadlessSurface> {
        AsciiAnimationSystem::new(
            HeadlessSurface::new(100, 30),
            config(),
            Box::new(StaticSignals::default()),
            Box::new(store),
        )
        .unwrap()
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn status_line(sys: &AsciiAnimationSystem<HeadlessSurface>) -> String {
        sys.surface().text().lines().last().unwrap_or_default().to_string()
    }

    #[test]
    fn test_empty_surface_is_rejected() {
        let result = AsciiAnimationSystem::new(
            HeadlessSurface::new(0, 10),
            config(),
            Box::new(StaticSignals::default()),
            Box::new(MemoryThemeStore::new()),
        );
        assert!(matches!(result, Err(AsciiscapeError::CanvasUnavailable(_))));
    }

    #[test]
    fn test_failed_listener_leaves_nothing_registered() {
        let surface = HeadlessSurface::new(80, 24).refusing(Capability::FocusEvents);
        let log = surface.capability_log();
        let result = AsciiAnimationSystem::new(
            surface,
            config(),
            Box::new(StaticSignals::default()),
            Box::new(MemoryThemeStore::new()),
        );
        assert!(matches!(result, Err(AsciiscapeError::Listener(_))));
        assert_eq!(
            log.events(),
            vec![
                CapabilityEvent::Acquired(Capability::PointerEvents),
                CapabilityEvent::Released(Capability::PointerEvents),
            ]
        );
        assert!(log.outstanding().is_empty());
    }

    #[test]
    fn test_destroy_releases_listeners_newest_first() {
        let surface = HeadlessSurface::new(80, 24);
        let log = surface.capability_log();
        let mut sys = AsciiAnimationSystem::new(
            surface,
            config(),
            Box::new(StaticSignals::default()),
            Box::new(MemoryThemeStore::new()),
        )
        .unwrap();
        sys.destroy();
        assert_eq!(
            log.events()[2..],
            [
                CapabilityEvent::Released(Capability::FocusEvents),
                CapabilityEvent::Released(Capability::PointerEvents),
            ]
        );
    }

    #[test]
    fn test_frames_run_only_after_start() {
        let mut sys = engine(MemoryThemeStore::new());
        let t0 = Instant::now();
        assert!(!sys.frame(t0).unwrap());
        sys.start();
        assert!(sys.is_running());
        assert!(sys.frame(t0).unwrap());
        assert_eq!(sys.stage().time(), 1.0);
        assert_eq!(sys.surface().presents(), 1);
    }

    #[test]
    fn test_frame_respects_budget() {
        let mut sys = AsciiAnimationSystem::new(
            HeadlessSurface::new(80, 24),
            Config::default().with_fps(10),
            Box::new(StaticSignals::default()),
            Box::new(MemoryThemeStore::new()),
        )
        .unwrap();
        sys.start();
        let t0 = Instant::now();
        assert!(sys.frame(t0).unwrap());
        assert!(!sys.frame(t0 + Duration::from_millis(50)).unwrap());
        assert_eq!(sys.next_deadline(t0), Some(t0 + Duration::from_millis(100)));
        assert!(sys.frame(t0 + Duration::from_millis(100)).unwrap());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut sys = engine(MemoryThemeStore::new());
        sys.start();
        sys.pause();
        assert!(!sys.is_running());
        assert_eq!(sys.scheduler().pending_frame_requests(), 0);
        sys.resume();
        assert!(sys.is_running());
        assert_eq!(sys.scheduler().pending_frame_requests(), 1);
    }

    #[test]
    fn test_hidden_does_not_override_explicit_pause() {
        let mut sys = engine(MemoryThemeStore::new());
        sys.start();
        sys.pause();
        sys.handle_visibility(false);
        sys.handle_visibility(true);
        assert!(!sys.is_running());
        sys.resume();
        assert!(sys.is_running());
    }

    #[test]
    fn test_theme_switch_persists_and_publishes() {
        let store = MemoryThemeStore::new();
        let mut sys = engine(store.clone());
        let mut rx = sys.subscribe_theme();
        let t0 = Instant::now();

        sys.handle_key(key('t'), t0);
        let info = sys.theme_info();
        assert_eq!(info.index, 1);
        assert_eq!(info.tone, Tone::Light);
        assert_eq!(store.load_index(), Some(1));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), info);
        assert!(sys.stage().effects().document().is_transitioning());
    }

    #[test]
    fn test_transition_marker_clears_after_duration() {
        let mut sys = engine(MemoryThemeStore::new());
        let t0 = Instant::now();
        sys.switch_theme(EffectSelection::Next, t0);
        assert!(sys.frame(t0).unwrap());
        assert!(sys.stage().effects().document().is_transitioning());

        assert!(sys.frame(t0 + Duration::from_millis(400)).unwrap());
        assert!(!sys.stage().effects().document().is_transitioning());
        assert_eq!(sys.scheduler().active_task_count(), 0);
    }

    #[test]
    fn test_restores_persisted_theme() {
        let mut seed = MemoryThemeStore::new();
        seed.save(4, Tone::Dark).unwrap();
        let sys = engine(seed);
        assert_eq!(sys.theme_info().index, 4);
        assert_eq!(sys.stage().effects().document().scheme(), Some("scheme-spotlight"));
    }

    #[test]
    fn test_command_line_theme_by_number_and_name() {
        let mut sys = engine(MemoryThemeStore::new());
        let t0 = Instant::now();
        for c in ":theme 3".chars() {
            sys.handle_key(key(c), t0);
        }
        sys.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), t0);
        assert_eq!(sys.theme_info().index, 2);

        for c in ":colorscheme glitch".chars() {
            sys.handle_key(key(c), t0);
        }
        sys.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), t0);
        assert_eq!(sys.theme_info().name, "glitch");
        assert_eq!(sys.mode(), Mode::Normal);
    }

    #[test]
    fn test_unknown_command_sets_message() {
        let mut sys = engine(MemoryThemeStore::new());
        let t0 = Instant::now();
        for c in ":bogus".chars() {
            sys.handle_key(key(c), t0);
        }
        let control = sys.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), t0);
        assert_eq!(control, Control::Continue);
        assert_eq!(sys.stage().message(), Some("Not an editor command: bogus"));
    }

    #[test]
    fn test_quit_command() {
        let mut sys = engine(MemoryThemeStore::new());
        let t0 = Instant::now();
        sys.handle_key(key(':'), t0);
        sys.handle_key(key('q'), t0);
        let control = sys.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), t0);
        assert_eq!(control, Control::Quit);
    }

    #[test]
    fn test_mode_reaches_effects() {
        let mut sys = engine(MemoryThemeStore::new());
        sys.handle_key(key('v'), Instant::now());
        assert_eq!(sys.stage().effects().current_mode(), Mode::Visual);
    }

    #[test]
    fn test_resize_is_debounced() {
        let mut sys = engine(MemoryThemeStore::new());
        let t0 = Instant::now();
        sys.handle_resize(60, 20, t0);
        sys.handle_resize(120, 40, t0 + Duration::from_millis(50));
        sys.poll_deferred(t0 + Duration::from_millis(100));
        assert_eq!(sys.stage().canvas().area.width, 100);

        sys.poll_deferred(t0 + Duration::from_millis(250));
        assert_eq!(sys.stage().canvas().area, Rect::new(0, 0, 120, 40));
        assert_eq!(sys.stage().particles().area().height, 40 - STATUS_ROWS);
    }

    #[test]
    fn test_pointer_is_throttled() {
        let mut sys = engine(MemoryThemeStore::new());
        let t0 = Instant::now();
        sys.handle_pointer(Some((5, 5)), t0);
        sys.handle_pointer(Some((9, 9)), t0 + Duration::from_millis(1));
        assert_eq!(sys.stage().effects().mouse_position(), Some((5.0, 5.0)));

        sys.handle_pointer(None, t0 + Duration::from_millis(2));
        assert_eq!(sys.stage().effects().mouse_position(), None);
    }

    #[test]
    fn test_memory_pressure_pauses_low_tier() {
        let signals = StaticSignals::new(PerformanceTier::Low);
        let mut sys = AsciiAnimationSystem::new(
            HeadlessSurface::new(80, 24),
            config(),
            Box::new(signals.clone()),
            Box::new(MemoryThemeStore::new()),
        )
        .unwrap();
        sys.start();
        signals.set_memory_pressure(true);

        let step = sys.budget().interval();
        let mut now = Instant::now();
        for frame in 0..WATCHDOG_EVERY {
            assert!(!sys.is_paused(), "paused early at frame {}", frame);
            assert!(sys.frame(now).unwrap());
            now += step;
        }
        assert!(sys.is_paused());
        assert!(!sys.is_running());
        assert!(!sys.frame(now).unwrap());
        assert!(status_line(&sys).contains("paused: memory pressure"));
    }

    #[test]
    fn test_status_line_redrawn_while_paused() {
        let mut sys = engine(MemoryThemeStore::new());
        sys.start();
        let t0 = Instant::now();
        assert!(sys.frame(t0).unwrap());

        for c in ":pause".chars() {
            sys.handle_key(key(c), t0);
        }
        sys.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), t0);
        assert!(sys.is_paused());
        assert!(status_line(&sys).contains("paused"));
        assert!(status_line(&sys).contains("-- NORMAL --"));

        for c in ":resu".chars() {
            sys.handle_key(key(c), t0);
        }
        for i in 1..=10 {
            assert!(!sys.frame(t0 + Duration::from_millis(100 * i)).unwrap());
        }
        let line = status_line(&sys);
        assert!(line.starts_with(":resu"), "status line was {:?}", line);
        assert!(line.contains("paused"));

        for c in "me".chars() {
            sys.handle_key(key(c), t0);
        }
        sys.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), t0);
        assert!(sys.is_running());
    }

    #[test]
    fn test_destroy_is_idempotent_and_closes_channel() {
        let mut sys = engine(MemoryThemeStore::new());
        let rx = sys.subscribe_theme();
        sys.start();
        sys.destroy();
        sys.destroy();
        assert!(sys.is_destroyed());
        assert_eq!(sys.listener_count(), 0);
        assert!(sys.surface().held().is_empty());
        assert!(sys.stage().particles().is_empty());
        assert!(rx.has_changed().is_err());
        assert!(!sys.frame(Instant::now()).unwrap());

        sys.start();
        assert!(!sys.is_running());
    }
}
