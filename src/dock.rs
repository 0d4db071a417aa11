//! Embed / unembed lifecycle for one host window
//!
//! A [`SidebarDock`] owns the app-bar registration and the window state saved
//! before docking. It is embedded exactly when it holds a live
//! [`AppBarHandle`]; there is no separate state flag that could drift.

use tracing::{debug, error, info, warn};

use crate::appbar::{AppBarHandle, AppBarTransport, ShellBarRegistrar};
use crate::bar_rect;
use crate::config::{ConfigStore, ConfigUpdate, SidebarConfig};
use crate::error::DockResult;
use crate::events::{DockEvent, EventBus};
use crate::geometry::{Rect, WindowGeometry};
use crate::host::{ChromeFlags, HostWindow};
use crate::monitor::MonitorResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedState {
    Unembedded,
    Embedded,
}

/// Read-only snapshot returned by [`SidebarDock::status`]
#[derive(Debug, Clone, PartialEq)]
pub struct DockStatus {
    pub state: EmbedState,
    pub config: SidebarConfig,
    pub has_saved_geometry: bool,
    /// Rectangle committed by the most recent successful embed
    pub last_rect: Option<Rect>,
}

/// Window state captured right before docking
#[derive(Debug, Clone, Copy, Default)]
struct SavedWindow {
    geometry: Option<WindowGeometry>,
    chrome: Option<ChromeFlags>,
}

pub struct SidebarDock<W, M, T>
where
    W: HostWindow,
    M: MonitorResolver,
    T: AppBarTransport,
{
    window: W,
    monitors: M,
    registrar: ShellBarRegistrar<T>,
    store: ConfigStore,
    config: SidebarConfig,
    handle: Option<AppBarHandle>,
    saved: Option<SavedWindow>,
    last_rect: Option<Rect>,
    events: EventBus,
}

impl<W, M, T> SidebarDock<W, M, T>
where
    W: HostWindow,
    M: MonitorResolver,
    T: AppBarTransport,
{
    pub fn new(window: W, monitors: M, transport: T, store: ConfigStore) -> Self {
        Self::with_defaults(window, monitors, transport, store, &SidebarConfig::default())
    }

    /// Like [`SidebarDock::new`], with caller-supplied defaults under the on-disk record
    pub fn with_defaults(window: W, monitors: M, transport: T, store: ConfigStore, defaults: &SidebarConfig) -> Self {
        let config = store.load_with_defaults(defaults);
        info!(
            window = window.id(),
            edge = %config.edge,
            width = config.width,
            top_offset = config.top_offset,
            "Sidebar dock ready"
        );
        Self {
            window,
            monitors,
            registrar: ShellBarRegistrar::new(transport),
            store,
            config,
            handle: None,
            saved: None,
            last_rect: None,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&DockEvent) + 'static) {
        self.events.subscribe(listener);
    }

    pub fn state(&self) -> EmbedState {
        if self.handle.is_some() {
            EmbedState::Embedded
        } else {
            EmbedState::Unembedded
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn config(&self) -> &SidebarConfig {
        &self.config
    }

    pub fn registrar(&self) -> &ShellBarRegistrar<T> {
        &self.registrar
    }

    pub fn status(&self) -> DockStatus {
        DockStatus {
            state: self.state(),
            config: self.config.clone(),
            has_saved_geometry: self.saved.is_some_and(|s| s.geometry.is_some()),
            last_rect: self.last_rect,
        }
    }

    /// Dock the window. Returns true if the window is docked afterwards.
    pub fn embed(&mut self) -> bool {
        self.embed_from(None).is_ok()
    }

    /// [`SidebarDock::embed`] keeping the failure for callers that report it.
    /// `prior` replaces the fresh snapshot when docking again right after an
    /// unembed, before the host has applied the restored geometry.
    fn embed_from(&mut self, prior: Option<SavedWindow>) -> DockResult<()> {
        if self.handle.is_some() {
            debug!("embed requested while already embedded");
            return Ok(());
        }

        let saved = prior.unwrap_or_else(|| self.snapshot());
        match self.try_embed(&saved) {
            Ok(rect) => {
                self.saved = Some(saved);
                self.last_rect = Some(rect);
                if saved.geometry.is_some() {
                    self.config.last_free_geometry = saved.geometry;
                }
                info!(window = self.window.id(), edge = %self.config.edge, rect = ?rect, "Window embedded");
                self.events.emit(DockEvent::Embedded);
                self.persist();
                Ok(())
            }
            Err(e) => {
                self.roll_back(&saved);
                let message = format!("embed failed: {e}");
                error!(window = self.window.id(), error = %e, "Failed to embed window");
                self.events.emit(DockEvent::Error(message));
                Err(e)
            }
        }
    }

    /// Undock the window. Returns false if any step reported an error; the
    /// window is unembedded either way.
    pub fn unembed(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            debug!("unembed requested while not embedded");
            return true;
        };

        let mut failures = Vec::new();
        if let Err(e) = self.registrar.unregister(Some(handle)) {
            failures.push(e.to_string());
        }

        let saved = self.saved.take().unwrap_or_default();
        let chrome = saved.chrome.unwrap_or_else(ChromeFlags::bordered);
        if let Err(e) = self.window.set_chrome(chrome) {
            failures.push(e.to_string());
        }
        if let Some(geometry) = saved.geometry {
            if let Err(e) = self.window.set_geometry(geometry) {
                failures.push(e.to_string());
            }
            // The host may apply the move later; a fresh geometry read could still see the strip
            self.config.last_free_geometry = Some(geometry);
        }

        info!(window = self.window.id(), "Window unembedded");
        self.events.emit(DockEvent::Unembedded);
        self.persist();

        if failures.is_empty() {
            true
        } else {
            let message = format!("unembed failed: {}", failures.join("; "));
            error!(window = self.window.id(), errors = ?failures, "Errors while unembedding window");
            self.events.emit(DockEvent::Error(message));
            false
        }
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_embedded() {
            self.unembed()
        } else {
            self.embed()
        }
    }

    /// Apply a partial config change. A docked window is re-docked so the new
    /// edge, width or offset takes effect immediately.
    ///
    /// If the re-dock fails the new config is kept, the window is left
    /// undocked and the embed error is returned.
    pub fn update_config(&mut self, update: &ConfigUpdate) -> DockResult<()> {
        self.config.apply(update)?;
        info!(update = ?update, "Sidebar config updated");

        let mut result = Ok(());
        if update.moves_bar() && self.is_embedded() {
            info!("Re-docking to apply new bar geometry");
            let prior = self.saved;
            self.unembed();
            result = self.embed_from(prior);
        }
        self.persist();
        result
    }

    /// Apply `name=value` options; unknown names fail with `InvalidOption`
    pub fn update_options<K, V>(&mut self, options: impl IntoIterator<Item = (K, V)>) -> DockResult<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let update = ConfigUpdate::from_options(options)?;
        self.update_config(&update)
    }

    /// Re-read the config file and apply any changed dock parameters
    pub fn reload_config(&mut self) -> DockResult<()> {
        let fresh = self.store.load();
        let mut update = ConfigUpdate::new();
        if fresh.edge != self.config.edge {
            update.edge = Some(fresh.edge);
        }
        if fresh.width != self.config.width {
            update.width = Some(fresh.width);
        }
        if fresh.height != self.config.height {
            update.height = Some(fresh.height);
        }
        if fresh.top_offset != self.config.top_offset {
            update.top_offset = Some(fresh.top_offset);
        }
        if fresh.auto_save != self.config.auto_save {
            update.auto_save = Some(fresh.auto_save);
        }

        if update.is_empty() {
            debug!(path = %self.store.path().display(), "Config reload found no changes");
            return Ok(());
        }
        self.update_config(&update)
    }

    /// Move the window back to where it was last seen free-floating
    pub fn restore_free_geometry(&mut self) -> bool {
        if self.is_embedded() {
            debug!("skipping geometry restore while embedded");
            return false;
        }
        let Some(geometry) = self.config.last_free_geometry else {
            return false;
        };
        match self.window.set_geometry(geometry) {
            Ok(()) => {
                info!(geometry = ?geometry, "Restored free-floating window geometry");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore window geometry");
                self.events.emit(DockEvent::Error(format!("restore geometry failed: {e}")));
                false
            }
        }
    }

    /// Release the reservation before the host window goes away
    pub fn cleanup(&mut self) {
        if self.is_embedded() {
            info!(window = self.window.id(), "Releasing app-bar on cleanup");
            self.unembed();
        }
    }

    /// Write the config regardless of `auto_save`. An undocked window's
    /// current position is recorded as its free-floating geometry.
    pub fn save_config(&mut self) -> DockResult<()> {
        if !self.is_embedded() {
            match self.window.geometry() {
                Ok(geometry) => self.config.last_free_geometry = Some(geometry),
                Err(e) => warn!(error = %e, "Could not read window geometry for config"),
            }
        }
        self.write_config()
    }

    fn write_config(&mut self) -> DockResult<()> {
        self.config.last_embedded = self.is_embedded();
        self.store.save(&self.config)
    }

    /// Auto-save after a transition or update, using the geometry the dock
    /// already knows rather than re-reading the window
    fn persist(&mut self) {
        if !self.config.auto_save {
            return;
        }
        if let Err(e) = self.write_config() {
            warn!(error = %e, "Failed to save sidebar config");
            self.events.emit(DockEvent::Error(format!("save config failed: {e}")));
        }
    }

    fn snapshot(&self) -> SavedWindow {
        let geometry = self
            .window
            .geometry()
            .inspect_err(|e| warn!(error = %e, "Could not read window geometry before docking"))
            .ok();
        let chrome = self
            .window
            .chrome()
            .inspect_err(|e| warn!(error = %e, "Could not read window chrome before docking"))
            .ok();
        SavedWindow { geometry, chrome }
    }

    fn try_embed(&mut self, saved: &SavedWindow) -> DockResult<Rect> {
        let docked = saved.chrome.unwrap_or_else(ChromeFlags::bordered).docked();
        self.window.set_chrome(docked)?;

        let window_id = self.window.id();
        let monitor = self.monitors.resolve(window_id)?;
        debug!(full = ?monitor.full, work = ?monitor.work, "Resolved monitor");

        let candidate = bar_rect::compute(
            self.config.edge,
            monitor.full,
            self.config.width,
            self.config.height,
            self.config.top_offset,
        );

        let handle = self.registrar.register(window_id, self.config.edge)?;
        match self.commit(&handle, candidate) {
            Ok(rect) => {
                self.handle = Some(handle);
                Ok(rect)
            }
            Err(e) => {
                if let Err(remove_err) = self.registrar.unregister(Some(handle)) {
                    warn!(error = %remove_err, "Failed to remove app-bar after aborted embed");
                }
                Err(e)
            }
        }
    }

    fn commit(&mut self, handle: &AppBarHandle, candidate: Rect) -> DockResult<Rect> {
        let adjusted = self.registrar.query_position(handle, candidate)?;
        let committed = self.registrar.set_position(handle, adjusted)?;
        self.window.place_above(committed)?;
        Ok(committed)
    }

    fn roll_back(&mut self, saved: &SavedWindow) {
        let chrome = saved.chrome.unwrap_or_else(ChromeFlags::bordered);
        if let Err(e) = self.window.set_chrome(chrome) {
            warn!(error = %e, "Failed to restore window chrome after aborted embed");
        }
        if let Some(geometry) = saved.geometry {
            if let Err(e) = self.window.set_geometry(geometry) {
                warn!(error = %e, "Failed to restore window geometry after aborted embed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appbar::tests::FakeTransport;
    use crate::appbar::AppBarMessage;
    use crate::error::DockError;
    use crate::geometry::{Edge, MonitorInfo, WindowId};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    const WINDOW: WindowId = 0x2a00007;
    const START: WindowGeometry = WindowGeometry::new(200, 150, 800, 600);

    #[derive(Debug)]
    struct WindowState {
        geometry: WindowGeometry,
        chrome: ChromeFlags,
        raised: bool,
        fail_place: bool,
        /// Queue geometry changes until `apply_pending` like a window manager would
        defer_moves: bool,
        pending: Option<WindowGeometry>,
    }

    #[derive(Clone)]
    struct FakeWindow(Rc<RefCell<WindowState>>);

    impl FakeWindow {
        fn new() -> Self {
            Self(Rc::new(RefCell::new(WindowState {
                geometry: START,
                chrome: ChromeFlags::DECORATED,
                raised: false,
                fail_place: false,
                defer_moves: false,
                pending: None,
            })))
        }

        fn apply_pending(&self) {
            let mut state = self.0.borrow_mut();
            if let Some(geometry) = state.pending.take() {
                state.geometry = geometry;
            }
        }
    }

    impl HostWindow for FakeWindow {
        fn id(&self) -> WindowId {
            WINDOW
        }

        fn geometry(&self) -> DockResult<WindowGeometry> {
            Ok(self.0.borrow().geometry)
        }

        fn set_geometry(&mut self, geometry: WindowGeometry) -> DockResult<()> {
            let mut state = self.0.borrow_mut();
            if state.defer_moves {
                state.pending = Some(geometry);
            } else {
                state.geometry = geometry;
            }
            Ok(())
        }

        fn chrome(&self) -> DockResult<ChromeFlags> {
            Ok(self.0.borrow().chrome)
        }

        fn set_chrome(&mut self, flags: ChromeFlags) -> DockResult<()> {
            self.0.borrow_mut().chrome = flags;
            Ok(())
        }

        fn place_above(&mut self, rect: Rect) -> DockResult<()> {
            let mut state = self.0.borrow_mut();
            if state.fail_place {
                return Err(DockError::Host("window vanished".to_string()));
            }
            state.geometry = rect.into();
            state.raised = true;
            Ok(())
        }
    }

    struct FakeMonitors(Option<MonitorInfo>);

    impl MonitorResolver for FakeMonitors {
        fn resolve(&self, window: WindowId) -> DockResult<MonitorInfo> {
            self.0.ok_or_else(|| DockError::resolution(window, "BadWindow"))
        }
    }

    fn full_hd() -> FakeMonitors {
        FakeMonitors(Some(MonitorInfo {
            full: Rect::new(0, 0, 1920, 1080),
            work: Rect::new(0, 0, 1920, 1040),
        }))
    }

    struct Harness {
        dock: SidebarDock<FakeWindow, FakeMonitors, FakeTransport>,
        window: FakeWindow,
        transport: FakeTransport,
        events: Rc<RefCell<Vec<DockEvent>>>,
        _dir: TempDir,
    }

    fn harness_with(monitors: FakeMonitors, transport: FakeTransport) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("sidebar.json"));
        let window = FakeWindow::new();
        let mut dock = SidebarDock::new(window.clone(), monitors, transport.clone(), store);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        dock.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        Harness { dock, window, transport, events, _dir: dir }
    }

    fn harness() -> Harness {
        harness_with(full_hd(), FakeTransport::default())
    }

    fn assert_handle_matches_state(h: &Harness) {
        assert_eq!(
            h.dock.status().state == EmbedState::Embedded,
            h.dock.registrar().is_registered(WINDOW)
        );
    }

    #[test]
    fn test_embed_left_full_height() {
        let mut h = harness();
        assert!(h.dock.embed());

        let status = h.dock.status();
        assert_eq!(status.state, EmbedState::Embedded);
        assert!(status.has_saved_geometry);
        assert_eq!(status.last_rect, Some(Rect::new(0, 0, 300, 1080)));

        let window = h.window.0.borrow();
        assert_eq!(window.geometry, WindowGeometry::new(0, 0, 300, 1080));
        assert!(window.raised);
        assert!(!window.chrome.contains(ChromeFlags::DECORATED));
        assert!(window.chrome.contains(ChromeFlags::STAYS_ON_TOP));

        assert_eq!(
            h.transport.messages(),
            vec![AppBarMessage::New, AppBarMessage::QueryPos, AppBarMessage::SetPos]
        );
        assert_eq!(*h.events.borrow(), vec![DockEvent::Embedded]);
    }

    #[test]
    fn test_embed_uses_window_manager_adjusted_rect() {
        let transport = FakeTransport {
            query_shift: 60,
            ..Default::default()
        };
        let mut h = harness_with(full_hd(), transport);
        assert!(h.dock.embed());
        assert_eq!(h.window.0.borrow().geometry, WindowGeometry::new(60, 0, 300, 1080));
        assert_eq!(h.dock.status().last_rect, Some(Rect::new(60, 0, 360, 1080)));
    }

    #[test]
    fn test_embed_right_with_offset() {
        let mut h = harness();
        let update = ConfigUpdate {
            edge: Some(Edge::Right),
            top_offset: Some(50),
            ..ConfigUpdate::default()
        };
        h.dock.update_config(&update).unwrap();
        assert!(h.dock.embed());
        assert_eq!(h.dock.status().last_rect, Some(Rect::new(1620, 50, 1920, 1080)));
    }

    #[test]
    fn test_embed_twice_is_noop() {
        let mut h = harness();
        assert!(h.dock.embed());
        let rect = h.dock.status().last_rect;
        let sent = h.transport.messages().len();

        assert!(h.dock.embed());
        assert_eq!(h.dock.status().last_rect, rect);
        assert_eq!(h.transport.messages().len(), sent);
        assert_eq!(h.events.borrow().len(), 1);
    }

    #[test]
    fn test_unembed_when_unembedded_sends_nothing() {
        let mut h = harness();
        assert!(h.dock.unembed());
        assert!(h.transport.messages().is_empty());
        assert!(h.events.borrow().is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_window() {
        let mut h = harness();
        assert!(h.dock.toggle());
        assert!(h.dock.is_embedded());
        assert!(h.dock.toggle());
        assert!(!h.dock.is_embedded());

        let window = h.window.0.borrow();
        assert_eq!(window.geometry, START);
        assert_eq!(window.chrome, ChromeFlags::DECORATED);
        assert_eq!(
            h.transport.messages().last(),
            Some(&AppBarMessage::Remove)
        );
        assert_eq!(*h.events.borrow(), vec![DockEvent::Embedded, DockEvent::Unembedded]);
        assert!(!h.dock.status().has_saved_geometry);
    }

    #[test]
    fn test_embed_failure_on_resolution_rolls_back() {
        let mut h = harness_with(FakeMonitors(None), FakeTransport::default());
        assert!(!h.dock.embed());

        assert_eq!(h.dock.state(), EmbedState::Unembedded);
        let window = h.window.0.borrow();
        assert_eq!(window.chrome, ChromeFlags::DECORATED);
        assert_eq!(window.geometry, START);
        assert!(h.transport.messages().is_empty());

        let events = h.events.borrow();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], DockEvent::Error(msg) if msg.contains("BadWindow")));
    }

    #[test]
    fn test_embed_failure_on_commit_releases_registration() {
        let transport = FakeTransport {
            fail_on: Some(AppBarMessage::SetPos),
            ..Default::default()
        };
        let mut h = harness_with(full_hd(), transport);
        assert!(!h.dock.embed());

        assert!(!h.dock.is_embedded());
        assert!(!h.dock.registrar().is_registered(WINDOW));
        assert_eq!(
            h.transport.messages(),
            vec![AppBarMessage::New, AppBarMessage::QueryPos, AppBarMessage::Remove]
        );
        assert_eq!(h.window.0.borrow().chrome, ChromeFlags::DECORATED);
        assert_handle_matches_state(&h);
    }

    #[test]
    fn test_embed_failure_on_placement_restores_geometry() {
        let mut h = harness();
        h.window.0.borrow_mut().fail_place = true;
        assert!(!h.dock.embed());
        assert_eq!(h.window.0.borrow().geometry, START);
        assert!(!h.dock.registrar().is_registered(WINDOW));
    }

    #[test]
    fn test_failed_remove_still_unembeds() {
        let transport = FakeTransport {
            fail_on: Some(AppBarMessage::Remove),
            ..Default::default()
        };
        let mut h = harness_with(full_hd(), transport);
        assert!(h.dock.embed());
        assert!(!h.dock.unembed());

        assert_eq!(h.dock.state(), EmbedState::Unembedded);
        assert_eq!(h.window.0.borrow().geometry, START);
        let events = h.events.borrow();
        assert_eq!(events[1], DockEvent::Unembedded);
        assert!(matches!(&events[2], DockEvent::Error(_)));
    }

    #[test]
    fn test_update_config_rejects_unknown_option() {
        let mut h = harness();
        let before = h.dock.config().clone();
        let err = h.dock.update_options([("color", "red")]).unwrap_err();
        assert!(matches!(err, DockError::InvalidOption(_)));
        assert_eq!(*h.dock.config(), before);
    }

    #[test]
    fn test_update_config_while_embedded_redocks() {
        let mut h = harness();
        assert!(h.dock.embed());
        h.window.0.borrow_mut().defer_moves = true;
        h.dock.update_options([("edge", "right"), ("width", "400")]).unwrap();

        assert!(h.dock.is_embedded());
        assert_eq!(h.dock.status().last_rect, Some(Rect::new(1520, 0, 1920, 1080)));
        assert_eq!(
            h.transport.messages(),
            vec![
                AppBarMessage::New,
                AppBarMessage::QueryPos,
                AppBarMessage::SetPos,
                AppBarMessage::Remove,
                AppBarMessage::New,
                AppBarMessage::QueryPos,
                AppBarMessage::SetPos,
            ]
        );
        let log = h.transport.log.borrow();
        assert_eq!(log[4].1.edge, Edge::Right.wire_value());

        // free-floating geometry survives the re-dock
        drop(log);
        assert_eq!(h.dock.config().last_free_geometry, Some(START));
        assert!(h.dock.unembed());
        h.window.apply_pending();
        assert_eq!(h.window.0.borrow().geometry, START);
    }

    #[test]
    fn test_update_auto_save_only_does_not_redock() {
        let mut h = harness();
        assert!(h.dock.embed());
        h.dock.update_options([("auto_save", "false")]).unwrap();
        assert_eq!(h.transport.messages().len(), 3);
        assert!(!h.dock.config().auto_save);
    }

    #[test]
    fn test_cleanup_releases_reservation() {
        let mut h = harness();
        assert!(h.dock.embed());
        h.dock.cleanup();
        assert!(!h.dock.is_embedded());
        assert_eq!(h.transport.messages().last(), Some(&AppBarMessage::Remove));

        // second cleanup does nothing
        let sent = h.transport.messages().len();
        h.dock.cleanup();
        assert_eq!(h.transport.messages().len(), sent);
    }

    #[test]
    fn test_handle_matches_state_across_sequences() {
        let mut h = harness();
        assert_handle_matches_state(&h);
        for step in 0..12 {
            match step % 4 {
                0 => {
                    h.dock.embed();
                }
                1 => {
                    h.dock.toggle();
                }
                2 => {
                    h.dock.toggle();
                }
                _ => h.dock.cleanup(),
            }
            assert_handle_matches_state(&h);
        }
    }

    #[test]
    fn test_auto_save_persists_transitions() {
        let mut h = harness();
        let store = ConfigStore::new(h._dir.path().join("sidebar.json"));

        assert!(h.dock.embed());
        let saved = store.load();
        assert!(saved.last_embedded);
        assert_eq!(saved.last_free_geometry, Some(START));

        // window manager has not applied the restore yet when the config is written
        h.window.0.borrow_mut().defer_moves = true;
        assert!(h.dock.unembed());
        assert_eq!(h.window.0.borrow().geometry, WindowGeometry::new(0, 0, 300, 1080));
        let saved = store.load();
        assert!(!saved.last_embedded);
        assert_eq!(saved.last_free_geometry, Some(START));
    }

    #[test]
    fn test_unembed_records_saved_geometry_not_pending_window_state() {
        let mut h = harness();
        h.window.0.borrow_mut().defer_moves = true;
        let store = ConfigStore::new(h._dir.path().join("sidebar.json"));

        assert!(h.dock.embed());
        assert!(h.dock.unembed());
        assert_eq!(h.dock.config().last_free_geometry, Some(START));
        assert_eq!(store.load().last_free_geometry, Some(START));

        // once the move lands and the user drags the window, an explicit save picks it up
        h.window.apply_pending();
        h.window.0.borrow_mut().geometry = WindowGeometry::new(500, 300, 800, 600);
        h.dock.save_config().unwrap();
        assert_eq!(store.load().last_free_geometry, Some(WindowGeometry::new(500, 300, 800, 600)));
    }

    #[test]
    fn test_failed_redock_returns_error_and_keeps_new_config() {
        let mut h = harness();
        assert!(h.dock.embed());
        h.transport.fail_later.set(Some(AppBarMessage::SetPos));

        let err = h.dock.update_options([("width", "400")]).unwrap_err();
        assert!(matches!(err, DockError::Protocol { .. }));

        assert!(!h.dock.is_embedded());
        assert_handle_matches_state(&h);
        assert_eq!(h.dock.config().width, 400);
        let window = h.window.0.borrow();
        assert_eq!(window.geometry, START);
        assert_eq!(window.chrome, ChromeFlags::DECORATED);
        drop(window);

        let events = h.events.borrow();
        assert_eq!(events[..2], [DockEvent::Embedded, DockEvent::Unembedded]);
        assert!(matches!(events.last(), Some(DockEvent::Error(msg)) if msg.contains("set position")));

        let saved = ConfigStore::new(h._dir.path().join("sidebar.json")).load();
        assert_eq!(saved.width, 400);
        assert!(!saved.last_embedded);
    }

    #[test]
    fn test_oversized_default_width_is_clamped_before_embed() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("sidebar.json"));
        let defaults = SidebarConfig {
            edge: Edge::Right,
            width: 2_147_483_648,
            ..SidebarConfig::default()
        };
        let mut dock =
            SidebarDock::with_defaults(FakeWindow::new(), full_hd(), FakeTransport::default(), store, &defaults);
        assert_eq!(dock.config().width, crate::constants::validation::MAX_DIMENSION);
        assert!(dock.embed());
        assert_eq!(dock.status().last_rect, Some(Rect::new(1920 - 8192, 0, 1920, 1080)));
    }

    #[test]
    fn test_auto_save_disabled_writes_nothing() {
        let mut h = harness();
        h.dock.update_options([("auto_save", "no")]).unwrap();
        let path = h._dir.path().join("sidebar.json");
        assert!(!path.exists());

        assert!(h.dock.embed());
        assert!(!path.exists());

        h.dock.save_config().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_restore_free_geometry_from_config() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("sidebar.json"));
        let saved = SidebarConfig {
            last_free_geometry: Some(WindowGeometry::new(40, 60, 500, 700)),
            ..SidebarConfig::default()
        };
        store.save(&saved).unwrap();

        let window = FakeWindow::new();
        let mut dock = SidebarDock::new(window.clone(), full_hd(), FakeTransport::default(), store);
        assert!(dock.restore_free_geometry());
        assert_eq!(window.0.borrow().geometry, WindowGeometry::new(40, 60, 500, 700));
    }

    #[test]
    fn test_reload_config_applies_file_changes() {
        let mut h = harness();
        assert!(h.dock.embed());

        let store = ConfigStore::new(h._dir.path().join("sidebar.json"));
        let mut on_disk = store.load();
        on_disk.width = 256;
        store.save(&on_disk).unwrap();

        h.dock.reload_config().unwrap();
        assert_eq!(h.dock.config().width, 256);
        assert_eq!(h.dock.status().last_rect, Some(Rect::new(0, 0, 256, 1080)));
    }
}
