//! Low-level keyboard hook using `SetWindowsHookExW(WH_KEYBOARD_LL)`
//!
//! The OS calls the hook procedure on the thread that installed the hook,
//! while that thread pumps messages. The procedure must return quickly and
//! always forward to `CallNextHookEx`, or Windows silently removes the hook.

use std::cell::RefCell;

use tracing::{debug, info, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetForegroundWindow, GetMessageW, GetWindowTextLengthW,
    GetWindowTextW,
    PostThreadMessageW, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK,
    KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN,
    WM_SYSKEYUP,
};

use crate::keyboard::KeyStateSource;

use super::backend::{EventHandler, HookBackend, HookError, KeyAction, KeyEvent, SystemState};

thread_local! {
    /// Handler for the hook installed on this thread
    static HANDLER: RefCell<Option<EventHandler>> = RefCell::new(None);
}

/// Global keyboard hook registered on the calling thread
#[derive(Default)]
pub struct WindowsHook {
    hook: Option<HHOOK>,
}

impl HookBackend for WindowsHook {
    fn install(&mut self, handler: EventHandler) -> Result<(), HookError> {
        HANDLER.with(|slot| *slot.borrow_mut() = Some(handler));

        let installed = unsafe {
            GetModuleHandleW(None).and_then(|module| {
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), HINSTANCE(module.0), 0)
            })
        };

        match installed {
            Ok(hook) => {
                info!(hook = ?hook.0, "low-level keyboard hook registered");
                self.hook = Some(hook);
                Ok(())
            }
            Err(e) => {
                HANDLER.with(|slot| slot.borrow_mut().take());
                Err(HookError::Registration(e.message().to_string()))
            }
        }
    }

    fn uninstall(&mut self) {
        if let Some(hook) = self.hook.take() {
            if let Err(e) = unsafe { UnhookWindowsHookEx(hook) } {
                warn!(%e, "failed to unregister keyboard hook");
            }
        }
        let _ = HANDLER.try_with(|slot| slot.borrow_mut().take());
    }
}

impl Drop for WindowsHook {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// Hook procedure - must be fast and never block
unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let data = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
        let action = match wparam.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyAction::Down),
            WM_KEYUP | WM_SYSKEYUP => Some(KeyAction::Up),
            _ => None,
        };

        if let Some(action) = action {
            dispatch(&KeyEvent {
                vk_code: data.vkCode,
                scan_code: data.scanCode,
                flags: data.flags.0,
                time_ms: data.time,
                action,
            });
        }
    }

    CallNextHookEx(HHOOK::default(), code, wparam, lparam)
}

/// Run the handler unless it is already running further up this stack
fn dispatch(event: &KeyEvent) {
    let _ = HANDLER.try_with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            if let Some(handler) = slot.as_mut() {
                handler(event);
            }
        }
    });
}

/// Live desktop state read through Win32
#[derive(Debug, Default)]
pub struct WindowsDesktop;

impl KeyStateSource for WindowsDesktop {
    fn is_key_down(&self, code: u32) -> bool {
        // High bit set means the key is down right now
        unsafe { GetAsyncKeyState(code as i32) < 0 }
    }
}

impl SystemState for WindowsDesktop {
    fn foreground_title(&self) -> String {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                return String::new();
            }
            let capacity = GetWindowTextLengthW(hwnd).max(0) as usize + 1;
            let mut buffer = vec![0u16; capacity];
            let len = GetWindowTextW(hwnd, &mut buffer);
            title_from_utf16(&buffer, len)
        }
    }
}

/// Decode the first `len` units written by `GetWindowTextW`
fn title_from_utf16(buffer: &[u16], len: i32) -> String {
    let len = (len.max(0) as usize).min(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

/// Identifier of the calling thread, for [`post_quit`]
pub fn current_thread_id() -> u32 {
    unsafe { GetCurrentThreadId() }
}

/// Pump messages until `WM_QUIT` arrives; hook callbacks run from here
pub fn run_message_loop() {
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    debug!("message loop exited");
}

/// Ask the message loop on `thread_id` to exit
pub fn post_quit(thread_id: u32) {
    if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
        warn!(%e, thread_id, "failed to post quit message");
    }
}
