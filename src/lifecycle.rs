//! The render loop driver.
//!
//! A [`Lifecycle`] implementation provides the five phases; [`RenderLoop`]
//! calls them in the only valid order and tracks which phase it is in.

use crate::abs::ContextHints;
use crate::error::{HarnessError, Result};

/// Phase of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Initialized,
    ContentLoaded,
    Running,
    Unloaded,
}

/// What the driver needs from the window between frames.
pub trait WindowHost {
    fn poll_events(&mut self);
    fn should_close(&self) -> bool;
}

impl WindowHost for crate::abs::WindowContext {
    fn poll_events(&mut self) {
        crate::abs::WindowContext::poll_events(self)
    }

    fn should_close(&self) -> bool {
        crate::abs::WindowContext::should_close(self)
    }
}

/// The phases of an application run by [`RenderLoop`].
///
/// Everything created by `load_content` lives in `Resources`, which the
/// driver hands back by reference each frame and by value to `unload`.
pub trait Lifecycle {
    type Window: WindowHost;
    type Resources;

    /// Runs before any window or graphics context exists.
    fn initialize(&mut self, hints: &mut ContextHints);

    /// Runs once the graphics context is current.
    fn load_content(&mut self, window: &mut Self::Window) -> Result<Self::Resources>;

    fn update(&mut self, window: &mut Self::Window, resources: &mut Self::Resources);

    fn render(&mut self, window: &mut Self::Window, resources: &mut Self::Resources);

    /// Releases everything `load_content` created. The window is still alive.
    fn unload(&mut self, window: &mut Self::Window, resources: Self::Resources);
}

#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Uninitialized,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs `app` to completion.
    ///
    /// `open` creates the window from the hints gathered in `initialize`. A
    /// failure to open or to load content aborts before the loop starts.
    /// Once the loop exits, `unload` runs and then the window is dropped.
    pub fn run<L, F>(&mut self, app: &mut L, open: F) -> Result<()>
    where
        L: Lifecycle,
        F: FnOnce(&ContextHints) -> Result<L::Window>,
    {
        self.expect(LoopState::Uninitialized, "initialize")?;
        let mut hints = ContextHints::default();
        app.initialize(&mut hints);
        self.state = LoopState::Initialized;

        let mut window = open(&hints)?;

        self.expect(LoopState::Initialized, "load content")?;
        let mut resources = app.load_content(&mut window)?;
        self.state = LoopState::ContentLoaded;
        log::info!("Content loaded, entering render loop");

        self.state = LoopState::Running;
        while !window.should_close() {
            window.poll_events();
            app.update(&mut window, &mut resources);
            app.render(&mut window, &mut resources);
            self.frames += 1;
        }

        app.unload(&mut window, resources);
        self.state = LoopState::Unloaded;
        log::info!("Render loop finished after {} frames", self.frames);
        drop(window);
        Ok(())
    }

    fn expect(&self, state: LoopState, action: &'static str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(HarnessError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Initialize,
        Open,
        LoadContent,
        Poll,
        Update,
        Render,
        Unload(Vec<u32>),
        WindowDropped,
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct FakeWindow {
        log: Log,
        frames_left: u32,
    }

    impl WindowHost for FakeWindow {
        fn poll_events(&mut self) {
            self.log.borrow_mut().push(Call::Poll);
            self.frames_left = self.frames_left.saturating_sub(1);
        }

        fn should_close(&self) -> bool {
            self.frames_left == 0
        }
    }

    impl Drop for FakeWindow {
        fn drop(&mut self) {
            self.log.borrow_mut().push(Call::WindowDropped);
        }
    }

    /// Stand-in for GPU objects: ids handed out during load.
    struct FakeResources {
        objects: Vec<u32>,
    }

    struct FakeApp {
        log: Log,
        fail_load: bool,
        loaded: u32,
        rendered_before_load: bool,
    }

    impl FakeApp {
        fn new(log: &Log) -> Self {
            Self {
                log: Rc::clone(log),
                fail_load: false,
                loaded: 0,
                rendered_before_load: false,
            }
        }
    }

    impl Lifecycle for FakeApp {
        type Window = FakeWindow;
        type Resources = FakeResources;

        fn initialize(&mut self, _hints: &mut ContextHints) {
            self.log.borrow_mut().push(Call::Initialize);
        }

        fn load_content(&mut self, _window: &mut FakeWindow) -> Result<FakeResources> {
            self.log.borrow_mut().push(Call::LoadContent);
            if self.fail_load {
                return Err(HarnessError::ShaderCompileFailed {
                    stage: "vertex",
                    log: "bad".into(),
                });
            }
            self.loaded += 1;
            Ok(FakeResources {
                objects: vec![1, 2, 3],
            })
        }

        fn update(&mut self, _window: &mut FakeWindow, _resources: &mut FakeResources) {
            self.log.borrow_mut().push(Call::Update);
        }

        fn render(&mut self, _window: &mut FakeWindow, _resources: &mut FakeResources) {
            if self.loaded != 1 {
                self.rendered_before_load = true;
            }
            self.log.borrow_mut().push(Call::Render);
        }

        fn unload(&mut self, _window: &mut FakeWindow, resources: FakeResources) {
            self.log.borrow_mut().push(Call::Unload(resources.objects));
        }
    }

    fn open_with(log: &Log, frames: u32) -> impl FnOnce(&ContextHints) -> Result<FakeWindow> {
        let log = Rc::clone(log);
        move |_hints| {
            log.borrow_mut().push(Call::Open);
            Ok(FakeWindow {
                log,
                frames_left: frames,
            })
        }
    }

    #[test]
    fn phases_run_in_order() {
        let log: Log = Rc::default();
        let mut app = FakeApp::new(&log);
        let mut driver = RenderLoop::new();

        driver.run(&mut app, open_with(&log, 2)).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Call::Initialize,
                Call::Open,
                Call::LoadContent,
                Call::Poll,
                Call::Update,
                Call::Render,
                Call::Poll,
                Call::Update,
                Call::Render,
                Call::Unload(vec![1, 2, 3]),
                Call::WindowDropped,
            ]
        );
        assert_eq!(driver.state(), LoopState::Unloaded);
        assert_eq!(driver.frames(), 2);
        assert!(!app.rendered_before_load);
    }

    #[test]
    fn loop_is_skipped_when_close_already_requested() {
        let log: Log = Rc::default();
        let mut app = FakeApp::new(&log);
        let mut driver = RenderLoop::new();
        let open = {
            let log = Rc::clone(&log);
            move |_: &ContextHints| {
                Ok(FakeWindow {
                    log,
                    frames_left: 0,
                })
            }
        };

        driver.run(&mut app, open).unwrap();

        let calls = log.borrow();
        assert!(!calls.contains(&Call::Render));
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Unload(_))).count(),
            1
        );
    }

    #[test]
    fn failed_open_aborts_before_load() {
        let log: Log = Rc::default();
        let mut app = FakeApp::new(&log);
        let mut driver = RenderLoop::new();

        let err = driver
            .run(&mut app, |_| {
                Err::<FakeWindow, _>(HarnessError::ContextCreationFailed("no display".into()))
            })
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(*log.borrow(), vec![Call::Initialize]);
        assert_eq!(driver.state(), LoopState::Initialized);
    }

    #[test]
    fn failed_load_never_renders_or_unloads() {
        let log: Log = Rc::default();
        let mut app = FakeApp::new(&log);
        app.fail_load = true;
        let mut driver = RenderLoop::new();

        assert!(driver.run(&mut app, open_with(&log, 3)).is_err());

        let calls = log.borrow();
        assert!(!calls.contains(&Call::Render));
        assert!(!calls.iter().any(|c| matches!(c, Call::Unload(_))));
        assert_eq!(calls.last(), Some(&Call::WindowDropped));
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn driver_cannot_be_rerun() {
        let log: Log = Rc::default();
        let mut app = FakeApp::new(&log);
        let mut driver = RenderLoop::new();
        driver.run(&mut app, open_with(&log, 1)).unwrap();

        let err = driver.run(&mut app, open_with(&log, 1)).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::InvalidTransition {
                state: LoopState::Unloaded,
                ..
            }
        ));
        assert_eq!(app.loaded, 1);
    }
}
