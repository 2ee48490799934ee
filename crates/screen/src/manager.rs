use crate::screen::Screen;
use arcane_gfx::{GfxError, GraphicsBackend};
use arcane_input::InputSnapshot;

/// Screen name meaning "no screen". Compared case-insensitively.
pub const NONE_SCREEN: &str = "niL";

/// What the manager is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState<'a> {
    Empty,
    Active(&'a str),
}

fn is_none_name(name: &str) -> bool {
    name.is_empty() || name.eq_ignore_ascii_case(NONE_SCREEN)
}

/// Registry of named screens with at most one active.
///
/// Screens are kept in registration order, which is also the teardown order.
#[derive(Default)]
pub struct ScreenManager {
    screens: Vec<(String, Box<dyn Screen>)>,
    active: Option<usize>,
}

impl std::fmt::Debug for ScreenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenManager")
            .field("screens", &self.names().collect::<Vec<_>>())
            .field("active", &self.active_name())
            .finish()
    }
}

impl ScreenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `screen` under `name`.
    ///
    /// Returns `Ok(false)` and changes nothing if the name is taken. The first
    /// screen registered while nothing is active is shown immediately; if that
    /// `show` fails the screen stays registered and the error is returned.
    pub fn add_screen(
        &mut self,
        name: impl Into<String>,
        screen: Box<dyn Screen>,
        gfx: &mut dyn GraphicsBackend,
    ) -> Result<bool, GfxError> {
        let name = name.into();
        if self.contains(&name) {
            tracing::warn!(screen = %name, "a screen with this name is already registered");
            return Ok(false);
        }
        if is_none_name(&name) {
            tracing::warn!(screen = %name, "reserved screen name");
            return Ok(false);
        }

        let first = self.screens.is_empty() && self.active.is_none();
        tracing::debug!(screen = %name, "screen registered");
        self.screens.push((name, screen));
        if first {
            self.activate(self.screens.len() - 1, gfx)?;
        }
        Ok(true)
    }

    /// Make `name` the active screen, or deactivate for [`NONE_SCREEN`] / `""`.
    ///
    /// Unknown names are logged and ignored. Selecting the active screen again
    /// hides and re-shows it.
    pub fn set_active(&mut self, name: &str, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        if is_none_name(name) {
            self.deactivate(gfx);
            return Ok(());
        }
        let Some(index) = self.index_of(name) else {
            tracing::warn!(screen = name, "screen could not be found");
            return Ok(());
        };
        self.deactivate(gfx);
        self.activate(index, gfx)
    }

    /// Hide the active screen, if any.
    pub fn deactivate(&mut self, gfx: &mut dyn GraphicsBackend) {
        if let Some(index) = self.active.take() {
            let (name, screen) = &mut self.screens[index];
            screen.hide(gfx);
            tracing::debug!(screen = %name, "screen hidden");
        }
    }

    fn activate(&mut self, index: usize, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        let (name, screen) = &mut self.screens[index];
        match screen.show(gfx) {
            Ok(()) => {
                tracing::info!(screen = %name, "screen active");
                self.active = Some(index);
                Ok(())
            }
            Err(err) => {
                tracing::error!(screen = %name, error = %err, "screen failed to show");
                Err(err)
            }
        }
    }

    /// Hide the active screen, dispose every registered screen once, and empty
    /// the registry.
    pub fn dispose(&mut self, gfx: &mut dyn GraphicsBackend) {
        if self.screens.is_empty() {
            return;
        }
        self.deactivate(gfx);
        for (name, mut screen) in self.screens.drain(..) {
            screen.dispose(gfx);
            tracing::debug!(screen = %name, "screen disposed");
        }
    }

    pub fn update(&mut self, dt: f64, input: &InputSnapshot) {
        if let Some(index) = self.active {
            self.screens[index].1.update(dt, input);
        }
    }

    pub fn render(&self, alpha: f64, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        match self.active {
            Some(index) => self.screens[index].1.render(alpha, gfx),
            None => Ok(()),
        }
    }

    pub fn state(&self) -> ManagerState<'_> {
        match self.active_name() {
            Some(name) => ManagerState::Active(name),
            None => ManagerState::Empty,
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.map(|i| self.screens[i].0.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.screens.iter().map(|(name, _)| name.as_str())
    }

    pub fn screen(&self, name: &str) -> Option<&dyn Screen> {
        self.index_of(name).map(|i| self.screens[i].1.as_ref())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.screens.iter().position(|(n, _)| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcane_gfx::{HeadlessBackend, Mesh};
    use glam::Vec3;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records every lifecycle call and holds one mesh while shown.
    struct Probe {
        name: &'static str,
        log: Log,
        mesh: Option<Mesh>,
        fail_show: bool,
    }

    impl Probe {
        fn boxed(name: &'static str, log: &Log) -> Box<dyn Screen> {
            Box::new(Self {
                name,
                log: log.clone(),
                mesh: None,
                fail_show: false,
            })
        }

        fn failing(name: &'static str, log: &Log) -> Box<dyn Screen> {
            Box::new(Self {
                name,
                log: log.clone(),
                mesh: None,
                fail_show: true,
            })
        }

        fn record(&self, what: &str) {
            self.log.lock().push(format!("{}.{what}", self.name));
        }
    }

    impl Screen for Probe {
        fn show(&mut self, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
            self.record("show");
            if self.fail_show {
                return Err(GfxError::InvalidMesh("probe refused".into()));
            }
            self.mesh = Some(Mesh::quad(gfx, Vec3::ONE)?);
            Ok(())
        }

        fn hide(&mut self, gfx: &mut dyn GraphicsBackend) {
            self.record("hide");
            if let Some(mesh) = self.mesh.take() {
                mesh.dispose(gfx);
            }
        }

        fn dispose(&mut self, _gfx: &mut dyn GraphicsBackend) {
            self.record("dispose");
        }

        fn update(&mut self, _dt: f64, _input: &InputSnapshot) {
            self.record("update");
        }

        fn render(&self, _alpha: f64, _gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
            self.record("render");
            Ok(())
        }
    }

    fn count(log: &Log, entry: &str) -> usize {
        log.lock().iter().filter(|e| *e == entry).count()
    }

    #[test]
    fn first_screen_auto_activates_and_lifecycle_is_ordered() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();

        assert!(mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap());
        assert_eq!(count(&log, "a.show"), 1);
        assert_eq!(count(&log, "a.hide"), 0);
        assert_eq!(mgr.state(), ManagerState::Active("A"));

        assert!(mgr.add_screen("B", Probe::boxed("b", &log), &mut gfx).unwrap());
        assert_eq!(count(&log, "b.show"), 0);
        assert_eq!(mgr.active_name(), Some("A"));

        mgr.set_active("B", &mut gfx).unwrap();
        assert_eq!(*log.lock(), ["a.show", "a.hide", "b.show"]);

        mgr.set_active("niL", &mut gfx).unwrap();
        assert_eq!(count(&log, "b.hide"), 1);
        assert_eq!(mgr.state(), ManagerState::Empty);

        mgr.dispose(&mut gfx);
        assert_eq!(count(&log, "a.dispose"), 1);
        assert_eq!(count(&log, "b.dispose"), 1);
        assert_eq!(gfx.live_meshes(), 0);
    }

    #[test]
    fn none_sentinel_is_case_insensitive_and_empty_counts() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap();

        mgr.set_active("NIL", &mut gfx).unwrap();
        assert_eq!(mgr.state(), ManagerState::Empty);

        mgr.set_active("A", &mut gfx).unwrap();
        mgr.set_active("", &mut gfx).unwrap();
        assert_eq!(mgr.state(), ManagerState::Empty);
        assert_eq!(count(&log, "a.show"), 2);
        assert_eq!(count(&log, "a.hide"), 2);

        // deactivating twice hides once
        mgr.deactivate(&mut gfx);
        assert_eq!(count(&log, "a.hide"), 2);
    }

    #[test]
    fn duplicate_names_change_nothing() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        assert!(mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap());
        assert!(!mgr.add_screen("A", Probe::boxed("dup", &log), &mut gfx).unwrap());
        assert!(mgr.add_screen("B", Probe::boxed("b", &log), &mut gfx).unwrap());
        assert!(!mgr.add_screen("B", Probe::boxed("dup", &log), &mut gfx).unwrap());

        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.names().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(count(&log, "dup.show"), 0);
        mgr.dispose(&mut gfx);
        assert_eq!(count(&log, "dup.dispose"), 0);
    }

    #[test]
    fn reserved_name_is_rejected() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        assert!(!mgr.add_screen("nil", Probe::boxed("x", &log), &mut gfx).unwrap());
        assert!(mgr.is_empty());
    }

    #[test]
    fn unknown_name_is_a_no_op() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap();
        mgr.set_active("missing", &mut gfx).unwrap();
        assert_eq!(mgr.active_name(), Some("A"));
        assert_eq!(*log.lock(), ["a.show"]);
        mgr.dispose(&mut gfx);
    }

    #[test]
    fn reactivating_active_screen_hides_then_shows() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap();
        mgr.set_active("A", &mut gfx).unwrap();
        assert_eq!(*log.lock(), ["a.show", "a.hide", "a.show"]);
        assert_eq!(gfx.live_meshes(), 1);
        mgr.dispose(&mut gfx);
        assert_eq!(gfx.live_meshes(), 0);
    }

    #[test]
    fn only_active_screen_is_driven() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let input = InputSnapshot::new();
        let mut mgr = ScreenManager::new();

        mgr.update(0.1, &input);
        mgr.render(0.5, &mut gfx).unwrap();
        assert!(log.lock().is_empty());

        mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap();
        mgr.add_screen("B", Probe::boxed("b", &log), &mut gfx).unwrap();
        mgr.update(0.1, &input);
        mgr.render(0.5, &mut gfx).unwrap();
        assert_eq!(count(&log, "a.update"), 1);
        assert_eq!(count(&log, "a.render"), 1);
        assert_eq!(count(&log, "b.update"), 0);
        assert_eq!(count(&log, "b.render"), 0);
        mgr.dispose(&mut gfx);
    }

    #[test]
    fn failed_show_leaves_manager_empty() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap();
        mgr.add_screen("bad", Probe::failing("bad", &log), &mut gfx).unwrap();

        assert!(mgr.set_active("bad", &mut gfx).is_err());
        assert_eq!(mgr.state(), ManagerState::Empty);
        assert_eq!(count(&log, "a.hide"), 1);
        assert_eq!(count(&log, "bad.hide"), 0);
        assert_eq!(gfx.live_meshes(), 0);

        mgr.dispose(&mut gfx);
        assert_eq!(count(&log, "bad.dispose"), 1);
    }

    #[test]
    fn failed_first_show_keeps_registration() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        assert!(mgr.add_screen("bad", Probe::failing("bad", &log), &mut gfx).is_err());
        assert!(mgr.contains("bad"));
        assert_eq!(mgr.state(), ManagerState::Empty);
    }

    #[test]
    fn dispose_is_once_and_idempotent() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        mgr.dispose(&mut gfx);
        assert!(log.lock().is_empty());

        for name in ["a", "b", "c"] {
            mgr.add_screen(name, Probe::boxed(name, &log), &mut gfx).unwrap();
        }
        mgr.set_active("c", &mut gfx).unwrap();
        mgr.dispose(&mut gfx);
        mgr.dispose(&mut gfx);

        let log = log.lock();
        let tail: Vec<_> = log.iter().rev().take(4).rev().cloned().collect();
        assert_eq!(tail, ["c.hide", "a.dispose", "b.dispose", "c.dispose"]);
        assert!(mgr.is_empty());
    }

    #[test]
    fn show_hide_counts_track_transitions() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        mgr.add_screen("a", Probe::boxed("a", &log), &mut gfx).unwrap();
        mgr.add_screen("b", Probe::boxed("b", &log), &mut gfx).unwrap();

        let script = ["b", "a", "nil", "missing", "b", "", "a", "a", "b"];
        for name in script {
            mgr.set_active(name, &mut gfx).unwrap();
            for s in ["a", "b"] {
                let shows = count(&log, &format!("{s}.show"));
                let hides = count(&log, &format!("{s}.hide"));
                assert!(shows == hides || shows == hides + 1, "{s}: {shows} shows, {hides} hides");
                assert_eq!(shows == hides + 1, mgr.active_name() == Some(s));
            }
        }
        mgr.dispose(&mut gfx);
        assert_eq!(count(&log, "a.show"), count(&log, "a.hide"));
        assert_eq!(count(&log, "b.show"), count(&log, "b.hide"));
        assert_eq!(gfx.live_meshes(), 0);
    }

    #[test]
    fn screen_lookup() {
        let log = Log::default();
        let mut gfx = HeadlessBackend::new();
        let mut mgr = ScreenManager::new();
        mgr.add_screen("A", Probe::boxed("a", &log), &mut gfx).unwrap();
        assert!(mgr.screen("A").is_some());
        assert!(mgr.screen("B").is_none());
        mgr.dispose(&mut gfx);
    }
}
