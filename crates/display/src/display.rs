use std::{
    collections::HashMap,
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use scene::{Composite, Element, Window};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, error::TryRecvError},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{DisplayError, OutputSink, State};

/// Name the initial window is registered under.
pub const DEFAULT_WINDOW: &str = "default";

/// Label used for the per-iteration debug dump.
const LOOP_LABEL: &str = "Core loop:";

struct Shared {
    sink: Box<dyn OutputSink>,
    windows: HashMap<String, Box<dyn Composite>>,
    /// Always a key of `windows`.
    foreground: String,
    state: State,
    debug: Option<Box<dyn Write + Send>>,
}

impl Shared {
    fn dump(&mut self, label: &str) {
        let Shared {
            windows,
            foreground,
            state,
            debug,
            ..
        } = self;
        if let Some(w) = debug.as_mut()
            && let Err(err) = write_dump(w.as_mut(), label, foreground, *state, windows)
        {
            warn!("failed to write display debug output: {err}");
        }
    }
}

fn write_dump(
    w: &mut dyn Write,
    label: &str,
    foreground: &str,
    state: State,
    windows: &HashMap<String, Box<dyn Composite>>,
) -> io::Result<()> {
    writeln!(w, "######################- {label} -######################")?;
    writeln!(w, "Foreground: {foreground}")?;
    writeln!(w, "State: {}", state as u8)?;
    writeln!(w, "Windows:")?;

    let mut names: Vec<&String> = windows.keys().collect();
    names.sort();
    for name in names {
        let window = &windows[name];
        writeln!(
            w,
            "###########- {name}: {} elements -###########",
            window.elements().len()
        )?;
        for element in window.elements() {
            element.debug(w, element.kind())?;
        }
    }
    writeln!(w)?;
    w.flush()
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable handle for pushing state transitions to a display loop.
#[derive(Clone, Debug)]
pub struct Controller {
    tx: mpsc::Sender<State>,
}

impl Controller {
    /// Queues a transition, waiting while a previous one is still pending.
    /// Once the loop has exited the state is dropped.
    pub async fn set_state(&self, state: State) {
        if self.tx.send(state).await.is_err() {
            debug!(%state, "display loop has exited, dropping state");
        }
    }

    /// Like [`Controller::set_state`] for callers outside the async runtime.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_set_state(&self, state: State) {
        if self.tx.blocking_send(state).is_err() {
            debug!(%state, "display loop has exited, dropping state");
        }
    }

    /// Resolves once the display loop has exited.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drives an [`OutputSink`] by rendering the foreground window on a fixed
/// cadence.
///
/// The render loop starts as soon as the display is created and runs on the
/// current tokio runtime. Dropping the display (and every [`Controller`])
/// stops the loop as if [`State::Killed`] had been pushed.
pub struct Display {
    shared: Arc<Mutex<Shared>>,
    controller: Controller,
    task: JoinHandle<()>,
}

impl Display {
    /// Registers `initial` as [`DEFAULT_WINDOW`], makes it the foreground and
    /// starts rendering it every `framerate`.
    pub fn new(
        sink: impl OutputSink + 'static,
        initial: impl Composite + 'static,
        framerate: Duration,
    ) -> Result<Self, DisplayError> {
        let handle = Handle::try_current().map_err(|_| DisplayError::NoRuntime)?;

        let mut windows: HashMap<String, Box<dyn Composite>> = HashMap::new();
        windows.insert(DEFAULT_WINDOW.to_owned(), Box::new(initial));
        let shared = Arc::new(Mutex::new(Shared {
            sink: Box::new(sink),
            windows,
            foreground: DEFAULT_WINDOW.to_owned(),
            state: State::Running,
            debug: None,
        }));

        let (tx, rx) = mpsc::channel(1);
        let engine = Engine {
            shared: shared.clone(),
            control: rx,
            framerate,
        };
        let task = handle.spawn(engine.run());

        Ok(Self {
            shared,
            controller: Controller { tx },
            task,
        })
    }

    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    pub async fn set_state(&self, state: State) {
        self.controller.set_state(state).await
    }

    /// Current state as last adopted by the loop. Transitions still waiting
    /// in the channel are not reflected.
    pub fn state(&self) -> State {
        lock(&self.shared).state
    }

    pub fn foreground(&self) -> String {
        lock(&self.shared).foreground.clone()
    }

    /// Makes `name` the window rendered from the next frame on. Unknown names
    /// leave the current foreground untouched.
    #[instrument(skip(self))]
    pub fn set_foreground(&self, name: &str) -> Result<(), DisplayError> {
        let mut shared = lock(&self.shared);
        if !shared.windows.contains_key(name) {
            return Err(DisplayError::WindowNotFound(name.to_owned()));
        }
        debug!(previous = %shared.foreground, "switching foreground window");
        shared.foreground = name.to_owned();
        Ok(())
    }

    /// Registers an empty [`Window`] the size of the output sink. An existing
    /// window with the same name is replaced.
    pub fn add_window(&self, name: impl Into<String>) {
        let mut shared = lock(&self.shared);
        let size = shared.sink.bounds();
        let name = name.into();
        debug!(%name, ?size, "adding window");
        if shared
            .windows
            .insert(name.clone(), Box::new(Window::new(size)))
            .is_some()
        {
            debug!(%name, "replaced existing window");
        }
    }

    /// Registers a caller-built window. An existing window with the same name
    /// is replaced.
    pub fn insert_window(&self, name: impl Into<String>, window: impl Composite + 'static) {
        let name = name.into();
        debug!(%name, "inserting window");
        lock(&self.shared).windows.insert(name, Box::new(window));
    }

    /// Unregisters a window. The foreground window cannot be removed.
    pub fn remove_window(&self, name: &str) -> Result<Box<dyn Composite>, DisplayError> {
        let mut shared = lock(&self.shared);
        if shared.foreground == name {
            return Err(DisplayError::ForegroundInUse(name.to_owned()));
        }
        shared
            .windows
            .remove(name)
            .ok_or_else(|| DisplayError::WindowNotFound(name.to_owned()))
    }

    /// Names of all registered windows, in no particular order.
    pub fn windows(&self) -> Vec<String> {
        lock(&self.shared).windows.keys().cloned().collect()
    }

    /// Runs `f` with exclusive access to the named window. The render loop
    /// is held off until `f` returns.
    ///
    /// The display's lock is held while `f` runs, so `f` must not call back
    /// into this [`Display`]; doing so deadlocks.
    pub fn with_window<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut dyn Composite) -> R,
    ) -> Result<R, DisplayError> {
        let mut shared = lock(&self.shared);
        let window = shared
            .windows
            .get_mut(name)
            .ok_or_else(|| DisplayError::WindowNotFound(name.to_owned()))?;
        Ok(f(window.as_mut()))
    }

    pub fn add_element(
        &self,
        window: &str,
        element: impl Element + 'static,
    ) -> Result<(), DisplayError> {
        self.with_window(window, |w| w.add_element(Box::new(element)))
    }

    /// Dumps the display state to `w` at the start of every loop iteration.
    pub fn enable_debugging(&self, w: impl Write + Send + 'static) {
        lock(&self.shared).debug = Some(Box::new(w));
    }

    pub fn disable_debugging(&self) {
        lock(&self.shared).debug = None;
    }

    /// Writes the foreground name, state and every window's elements to `w`.
    pub fn debug(&self, w: &mut dyn Write, label: &str) -> io::Result<()> {
        let shared = lock(&self.shared);
        write_dump(w, label, &shared.foreground, shared.state, &shared.windows)
    }

    /// Resolves once the render loop has exited.
    pub async fn closed(&self) {
        self.controller.closed().await
    }

    pub fn is_terminated(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the render loop to exit.
    pub async fn join(self) -> Result<(), DisplayError> {
        let Self {
            controller, task, ..
        } = self;
        drop(controller);
        task.await.map_err(|err| {
            if err.is_panic() {
                DisplayError::LoopPanicked
            } else {
                DisplayError::LoopCancelled
            }
        })
    }
}

/// The background half of a [`Display`].
struct Engine {
    shared: Arc<Mutex<Shared>>,
    control: mpsc::Receiver<State>,
    framerate: Duration,
}

impl Engine {
    async fn run(mut self) {
        info!(framerate = ?self.framerate, "display loop started");
        loop {
            lock(&self.shared).dump(LOOP_LABEL);

            match self.control.try_recv() {
                Ok(state) => {
                    self.adopt(state);
                    continue;
                }
                Err(TryRecvError::Disconnected) => self.adopt(State::Killed),
                Err(TryRecvError::Empty) => {}
            }

            let state = lock(&self.shared).state;
            match state {
                State::Stopped => {
                    let next = self.control.recv().await.unwrap_or(State::Killed);
                    self.adopt(next);
                }
                State::Running => {
                    self.draw();
                    tokio::time::sleep(self.framerate).await;
                }
                State::Killed => break,
            }
        }
        info!("display loop exited");
    }

    fn adopt(&self, next: State) {
        let mut shared = lock(&self.shared);
        let current = shared.state;
        if current == State::Killed {
            debug!(%next, "ignoring transition out of killed");
            return;
        }
        if current != next {
            info!(from = %current, to = %next, "display state changed");
        }
        shared.state = next;
    }

    fn draw(&self) {
        let mut shared = lock(&self.shared);
        let Shared {
            sink,
            windows,
            foreground,
            ..
        } = &mut *shared;
        let Some(window) = windows.get_mut(foreground.as_str()) else {
            error!(%foreground, "foreground window is not registered");
            return;
        };
        let frame = window.render();
        sink.draw_over(frame);
        sink.render();
        trace!(%foreground, "frame pushed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameRecorder, FrameStats};
    use color::palette;
    use euclid::default::Size2D;
    use scene::Circle;

    const TICK: Duration = Duration::from_millis(10);

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
        fn banners(&self) -> usize {
            self.text().matches(LOOP_LABEL).count()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn create_display(window: Window) -> (Display, FrameStats) {
        let sink = FrameRecorder::new(Size2D::new(8, 8));
        let stats = sink.stats();
        let display = Display::new(sink, window, TICK).unwrap();
        (display, stats)
    }

    fn red_window() -> Window {
        let mut window = Window::new(Size2D::new(8, 8));
        window.push(Circle::new(4, 4, 2, palette::css::RED));
        window
    }

    async fn settle() {
        tokio::time::sleep(TICK * 5).await;
    }

    #[test]
    fn new_without_runtime_fails() {
        let sink = FrameRecorder::new(Size2D::new(8, 8));
        let result = Display::new(sink, red_window(), TICK);
        assert!(matches!(result, Err(DisplayError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn starts_running_and_renders_default() {
        let (display, stats) = create_display(red_window());
        settle().await;

        assert_eq!(display.state(), State::Running);
        assert_eq!(display.foreground(), DEFAULT_WINDOW);
        assert!(stats.frames() > 0);
        assert_eq!(stats.writes(), stats.frames());
        let frame = stats.last_frame().unwrap();
        assert_eq!(frame.pixel(4, 4), Some(palette::css::RED.to_rgba8()));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_foreground_is_rejected() {
        let (display, _stats) = create_display(red_window());
        display.add_window("menu");
        display.set_foreground("menu").unwrap();

        let err = display.set_foreground("missing").unwrap_err();
        assert!(matches!(err, DisplayError::WindowNotFound(name) if name == "missing"));
        assert_eq!(display.foreground(), "menu");

        display.set_foreground(DEFAULT_WINDOW).unwrap();
        assert_eq!(display.foreground(), DEFAULT_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn foreground_switch_renders_that_window() {
        let (display, stats) = create_display(red_window());
        display.add_window("blue");
        display
            .add_element("blue", Circle::new(4, 4, 2, palette::css::BLUE))
            .unwrap();
        settle().await;
        let frame = stats.last_frame().unwrap();
        assert_eq!(frame.pixel(4, 4), Some(palette::css::RED.to_rgba8()));

        display.set_foreground("blue").unwrap();
        settle().await;
        let frame = stats.last_frame().unwrap();
        assert_eq!(frame.pixel(4, 4), Some(palette::css::BLUE.to_rgba8()));
    }

    #[tokio::test(start_paused = true)]
    async fn added_windows_match_sink_bounds() {
        let (display, _stats) = create_display(red_window());
        display.add_window("extra");

        let mut names = display.windows();
        names.sort();
        assert_eq!(names, vec!["default".to_owned(), "extra".to_owned()]);

        let size = display.with_window("extra", |w| w.render().size()).unwrap();
        assert_eq!(size, Size2D::new(8, 8));
        assert_eq!(display.foreground(), DEFAULT_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_halts_rendering_until_running() {
        let (display, stats) = create_display(red_window());
        settle().await;

        display.set_state(State::Stopped).await;
        settle().await;
        assert_eq!(display.state(), State::Stopped);
        let frames = stats.frames();

        tokio::time::sleep(TICK * 20).await;
        assert_eq!(stats.frames(), frames);

        display.set_state(State::Running).await;
        settle().await;
        assert_eq!(display.state(), State::Running);
        assert!(stats.frames() > frames);
    }

    #[tokio::test(start_paused = true)]
    async fn killed_is_terminal() {
        let (display, stats) = create_display(red_window());
        settle().await;

        display.set_state(State::Killed).await;
        display.closed().await;
        assert_eq!(display.state(), State::Killed);
        let frames = stats.frames();

        display.set_state(State::Running).await;
        tokio::time::sleep(TICK * 20).await;
        assert_eq!(stats.frames(), frames);
        assert_eq!(display.state(), State::Killed);

        display.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn kill_then_run_in_quick_succession_stays_killed() {
        let (display, stats) = create_display(red_window());
        let controller = display.controller();

        controller.set_state(State::Killed).await;
        controller.set_state(State::Running).await;
        controller.closed().await;
        let frames = stats.frames();

        tokio::time::sleep(TICK * 20).await;
        assert_eq!(stats.frames(), frames);
        assert_eq!(display.state(), State::Killed);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_display_ends_the_loop() {
        let (display, stats) = create_display(red_window());
        settle().await;
        drop(display);

        settle().await;
        let frames = stats.frames();
        tokio::time::sleep(TICK * 20).await;
        assert_eq!(stats.frames(), frames);
    }

    #[tokio::test(start_paused = true)]
    async fn debugging_emits_once_per_iteration() {
        let (display, _stats) = create_display(red_window());
        display.set_state(State::Stopped).await;
        settle().await;

        let buffer = SharedBuffer::default();
        display.enable_debugging(buffer.clone());
        settle().await;
        assert_eq!(buffer.banners(), 0, "emitted while blocked");

        // One wake-up from the blocking wait is one iteration.
        display.set_state(State::Stopped).await;
        settle().await;
        assert_eq!(buffer.banners(), 1);

        display.set_state(State::Running).await;
        settle().await;
        let running = buffer.banners();
        assert!(running > 2);

        display.disable_debugging();
        settle().await;
        assert_eq!(buffer.banners(), running);
    }

    #[tokio::test(start_paused = true)]
    async fn debug_dump_lists_every_window() {
        let (display, _stats) = create_display(red_window());
        display.add_window("empty");

        let mut out = Vec::new();
        display.debug(&mut out, "snapshot").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("######################- snapshot -######################\n"));
        assert!(text.contains("Foreground: default\n"));
        assert!(text.contains("State: 1\n"));
        assert!(text.contains("Windows:\n"));
        assert!(text.contains("###########- default: 1 elements -###########\n"));
        assert!(text.contains("###########- empty: 0 elements -###########\n"));
        assert!(text.contains("###- Circle -###\n"));
        assert!(text.ends_with("\n\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn foreground_window_cannot_be_removed() {
        let (display, _stats) = create_display(red_window());
        display.add_window("other");

        assert!(matches!(
            display.remove_window(DEFAULT_WINDOW),
            Err(DisplayError::ForegroundInUse(_))
        ));
        assert!(matches!(
            display.remove_window("nope"),
            Err(DisplayError::WindowNotFound(_))
        ));

        display.remove_window("other").unwrap();
        assert_eq!(display.windows(), vec![DEFAULT_WINDOW.to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn inserted_windows_can_be_shown() {
        let (display, stats) = create_display(red_window());
        let mut custom = Window::new(Size2D::new(8, 8));
        custom.push(Circle::new(4, 4, 2, palette::css::LIME));
        display.insert_window("custom", custom);

        display.set_foreground("custom").unwrap();
        settle().await;
        let frame = stats.last_frame().unwrap();
        assert_eq!(frame.pixel(4, 4), Some(palette::css::LIME.to_rgba8()));
    }

    #[tokio::test(start_paused = true)]
    async fn controller_works_from_plain_threads() {
        let (display, _stats) = create_display(red_window());
        let controller = display.controller();
        std::thread::spawn(move || controller.blocking_set_state(State::Killed))
            .join()
            .unwrap();

        display.closed().await;
        assert_eq!(display.state(), State::Killed);
        assert!(display.controller().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn transition_waits_for_the_frame_sleep() {
        let (display, stats) = create_display(red_window());

        // The first frame is drawn at t=0, then the loop sleeps one tick.
        tokio::time::sleep(TICK / 2).await;
        let frames = stats.frames();
        assert_eq!(frames, 1);

        display.set_state(State::Stopped).await;
        tokio::time::sleep(TICK / 4).await;
        assert_eq!(display.state(), State::Running, "adopted mid-sleep");

        tokio::time::sleep(TICK).await;
        assert_eq!(display.state(), State::Stopped);
        assert_eq!(stats.frames(), frames);
    }

    #[tokio::test(start_paused = true)]
    async fn killed_while_stopped_ends_the_loop() {
        let (display, stats) = create_display(red_window());
        settle().await;
        display.set_state(State::Stopped).await;
        settle().await;
        let frames = stats.frames();

        display.set_state(State::Killed).await;
        display.closed().await;
        assert_eq!(display.state(), State::Killed);

        display.set_state(State::Running).await;
        tokio::time::sleep(TICK * 20).await;
        assert_eq!(stats.frames(), frames);
        display.join().await.unwrap();
    }
}
