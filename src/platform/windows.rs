//! Win32 implementation of the overlay, hotkey, and foreground boundaries.
//!
//! One dedicated UI thread owns the overlay window: it registers the
//! window class, creates the window, registers the global hotkey (Win32
//! requires the registering thread to own the window), and runs the
//! message loop. Every mutation coming from other threads arrives as a
//! posted `WM_APP`-range message, so window state is only ever touched on
//! this thread.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};

use windows::core::{w, HSTRING, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateSolidBrush, DrawTextW, EndPaint, SetBkMode, SetTextColor, DT_NOPREFIX,
    DT_WORDBREAK, PAINTSTRUCT, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, MOD_ALT, MOD_CONTROL, VK_B,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect,
    GetForegroundWindow, GetMessageW, GetSystemMetrics, GetWindowLongPtrW, GetWindowTextW,
    InvalidateRect, LoadCursorW, MessageBoxW, PostMessageW, PostQuitMessage, RegisterClassW,
    SetWindowDisplayAffinity, SetWindowLongPtrW, SetWindowPos, ShowWindow, TranslateMessage,
    CREATESTRUCTW, CS_HREDRAW, CS_VREDRAW, GWLP_USERDATA, HWND_TOPMOST, IDC_ARROW,
    MB_ICONWARNING, MB_OK, MSG, SM_CXSCREEN, SM_CYSCREEN, SWP_NOACTIVATE, SWP_NOMOVE,
    SWP_NOSIZE, SW_HIDE, SW_SHOWNA, WDA_EXCLUDEFROMCAPTURE, WDA_NONE, WM_APP, WM_CLOSE,
    WM_DESTROY, WM_HOTKEY, WM_NCCREATE, WM_NCDESTROY, WM_PAINT, WNDCLASSW, WS_CAPTION,
    WS_EX_TOPMOST, WS_OVERLAPPED, WS_SYSMENU,
};

use crate::hotkey::{HotkeyBackend, HotkeyError, ToggleSender, HOTKEY_ID};
use crate::overlay::{DisplayAffinity, ForegroundInspector, OverlayBackend, OverlayError};

const WINDOW_TITLE: PCWSTR = w!("Screen Analysis");
const WINDOW_WIDTH: i32 = 800;
const WINDOW_HEIGHT: i32 = 600;
const CONTENT_PADDING: i32 = 20;

/// Dark slate RGB(40, 44, 52) as 0x00BBGGRR.
const BACKGROUND: COLORREF = COLORREF(0x0034_2C28);
const TEXT_COLOR: COLORREF = COLORREF(0x00FF_FFFF);

// Cross-thread requests, handled in `wndproc` on the UI thread.
const MSG_SET_VISIBLE: u32 = WM_APP + 1;
const MSG_CONTENT_CHANGED: u32 = WM_APP + 2;
const MSG_SET_AFFINITY: u32 = WM_APP + 3;
const MSG_RAISE: u32 = WM_APP + 4;
const MSG_UNREGISTER_HOTKEY: u32 = WM_APP + 5;
const MSG_QUIT: u32 = WM_APP + 6;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("overlay window creation failed: {0}")]
    WindowCreation(String),

    #[error("UI thread failed to start: {0}")]
    ThreadSpawn(String),
}

/// HWND as a plain integer so handles can cross threads. The window is
/// only mutated on the UI thread; other threads use the handle solely to
/// address posted messages.
#[derive(Clone, Copy)]
struct WindowHandle(isize);

unsafe impl Send for WindowHandle {}
unsafe impl Sync for WindowHandle {}

impl WindowHandle {
    fn hwnd(self) -> HWND {
        HWND(self.0 as *mut core::ffi::c_void)
    }
}

/// State shared between backend handles and the wndproc.
struct WindowShared {
    /// Current overlay text and loading flag, read by WM_PAINT.
    content: Mutex<(String, bool)>,
    toggle: ToggleSender,
}

/// Handle to the running UI thread.
pub struct UiThread {
    hwnd: WindowHandle,
    shared: Arc<WindowShared>,
    hotkey_outcome: Mutex<Option<Result<(), HotkeyError>>>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl UiThread {
    /// Create the overlay window on a fresh thread and start its message
    /// loop. Returns once the window exists and the hotkey registration
    /// has been attempted. Hotkey presses arrive on `toggle`.
    ///
    /// `initial_text` is what the window shows the first time it becomes
    /// visible outside a capture cycle.
    pub fn spawn(toggle: ToggleSender, initial_text: &str) -> Result<Self, PlatformError> {
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let initial = initial_text.to_string();

        let join = std::thread::Builder::new()
            .name("screen-veil-ui".into())
            .spawn(move || {
                match unsafe { create_overlay_window(toggle, initial) } {
                    Ok(created) => {
                        let _ = ready_tx.send(Ok(created));
                        unsafe { run_message_loop() };
                        log::debug!("[WIN32] message loop exited");
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| PlatformError::ThreadSpawn(e.to_string()))?;

        let (hwnd, shared, hotkey_outcome) = ready_rx
            .recv()
            .map_err(|_| PlatformError::ThreadSpawn("UI thread died during setup".into()))?
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;

        Ok(Self {
            hwnd,
            shared,
            hotkey_outcome: Mutex::new(Some(hotkey_outcome)),
            join: Some(join),
        })
    }

    pub fn overlay_backend(&self) -> Arc<dyn OverlayBackend> {
        Arc::new(Win32Overlay {
            hwnd: self.hwnd,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Hands out the hotkey backend. The registration itself already
    /// happened on the UI thread (Win32 ties WM_HOTKEY delivery to the
    /// thread owning the window); the backend reports that stored outcome.
    pub fn hotkey_backend(&self) -> Win32Hotkey {
        Win32Hotkey {
            hwnd: self.hwnd,
            outcome: Mutex::new(self.hotkey_outcome.lock().unwrap().take()),
        }
    }

    /// Ask the UI thread to destroy the window and exit its loop.
    pub fn request_quit(&self) {
        unsafe {
            let _ = PostMessageW(self.hwnd.hwnd(), MSG_QUIT, WPARAM(0), LPARAM(0));
        }
    }

    /// Wait for the message loop to finish. Call after `request_quit`.
    pub fn join(mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// One-time blocking notice, used for the hotkey registration warning.
pub fn warning_box(title: &str, text: &str) {
    unsafe {
        MessageBoxW(
            None,
            &HSTRING::from(text),
            &HSTRING::from(title),
            MB_OK | MB_ICONWARNING,
        );
    }
}

// ── Overlay backend ─────────────────────────────────────────────────────

struct Win32Overlay {
    hwnd: WindowHandle,
    shared: Arc<WindowShared>,
}

impl OverlayBackend for Win32Overlay {
    fn set_visible(&self, visible: bool) {
        unsafe {
            let _ = PostMessageW(
                self.hwnd.hwnd(),
                MSG_SET_VISIBLE,
                WPARAM(visible as usize),
                LPARAM(0),
            );
        }
    }

    fn set_content(&self, text: &str, loading: bool) {
        *self.shared.content.lock().unwrap() = (text.to_string(), loading);
        unsafe {
            let _ = PostMessageW(self.hwnd.hwnd(), MSG_CONTENT_CHANGED, WPARAM(0), LPARAM(0));
        }
    }

    fn set_affinity(&self, affinity: DisplayAffinity) -> Result<(), OverlayError> {
        let excluded = affinity == DisplayAffinity::Excluded;
        unsafe {
            PostMessageW(
                self.hwnd.hwnd(),
                MSG_SET_AFFINITY,
                WPARAM(excluded as usize),
                LPARAM(0),
            )
            .map_err(|e| OverlayError::AffinityUnsupported(e.to_string()))
        }
    }

    fn raise(&self) {
        unsafe {
            let _ = PostMessageW(self.hwnd.hwnd(), MSG_RAISE, WPARAM(0), LPARAM(0));
        }
    }
}

// ── Hotkey backend ──────────────────────────────────────────────────────

pub struct Win32Hotkey {
    hwnd: WindowHandle,
    outcome: Mutex<Option<Result<(), HotkeyError>>>,
}

impl HotkeyBackend for Win32Hotkey {
    fn register(&self, id: i32) -> Result<(), HotkeyError> {
        if id != HOTKEY_ID {
            return Err(HotkeyError::RegistrationFailed(format!(
                "unknown hotkey id {}",
                id
            )));
        }
        self.outcome
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(HotkeyError::RegistrationFailed("already registered".into())))
    }

    fn unregister(&self, _id: i32) {
        unsafe {
            let _ = PostMessageW(self.hwnd.hwnd(), MSG_UNREGISTER_HOTKEY, WPARAM(0), LPARAM(0));
        }
    }
}

// ── Foreground inspection ───────────────────────────────────────────────

/// Reads foreground-window state directly; these Win32 calls are safe from
/// any thread, so no marshaling is involved.
pub struct Win32ForegroundInspector;

impl ForegroundInspector for Win32ForegroundInspector {
    fn foreground_title(&self) -> Option<String> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return None;
            }
            let mut buf = [0u16; 256];
            let len = GetWindowTextW(hwnd, &mut buf);
            if len <= 0 {
                return None;
            }
            Some(String::from_utf16_lossy(&buf[..len as usize]))
        }
    }

    fn window_with_title_exists(&self, title: &str) -> bool {
        unsafe {
            windows::Win32::UI::WindowsAndMessaging::FindWindowW(
                PCWSTR::null(),
                &HSTRING::from(title),
            )
            .map(|h| !h.is_invalid())
            .unwrap_or(false)
        }
    }
}

// ── UI thread internals ─────────────────────────────────────────────────

type Created = (WindowHandle, Arc<WindowShared>, Result<(), HotkeyError>);

unsafe fn create_overlay_window(
    toggle: ToggleSender,
    initial_text: String,
) -> windows::core::Result<Created> {
    let instance: HINSTANCE = GetModuleHandleW(None)?.into();

    let class = WNDCLASSW {
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wndproc),
        hInstance: instance,
        hCursor: LoadCursorW(None, IDC_ARROW)?,
        hbrBackground: CreateSolidBrush(BACKGROUND),
        lpszClassName: w!("ScreenVeilOverlay"),
        ..Default::default()
    };
    if RegisterClassW(&class) == 0 {
        return Err(windows::core::Error::from_win32());
    }

    let shared = Arc::new(WindowShared {
        content: Mutex::new((initial_text, false)),
        toggle,
    });

    // Centered on the primary display, created hidden. The wndproc takes
    // its own Arc reference out of lpCreateParams at WM_NCCREATE.
    let x = (GetSystemMetrics(SM_CXSCREEN) - WINDOW_WIDTH) / 2;
    let y = (GetSystemMetrics(SM_CYSCREEN) - WINDOW_HEIGHT) / 2;
    let hwnd = CreateWindowExW(
        WS_EX_TOPMOST,
        w!("ScreenVeilOverlay"),
        WINDOW_TITLE,
        WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU,
        x,
        y,
        WINDOW_WIDTH,
        WINDOW_HEIGHT,
        None,
        None,
        instance,
        Some(Arc::into_raw(Arc::clone(&shared)) as *const core::ffi::c_void),
    )?;

    // WM_HOTKEY is delivered to the thread that owns the window, so the
    // registration has to happen here rather than in the hotkey channel.
    let hotkey_outcome = RegisterHotKey(hwnd, HOTKEY_ID, MOD_CONTROL | MOD_ALT, VK_B.0 as u32)
        .map_err(|e| HotkeyError::RegistrationFailed(e.to_string()));

    Ok((WindowHandle(hwnd.0 as isize), shared, hotkey_outcome))
}

unsafe fn run_message_loop() {
    let mut msg = MSG::default();
    while GetMessageW(&mut msg, None, 0, 0).into() {
        let _ = TranslateMessage(&msg);
        DispatchMessageW(&msg);
    }
}

unsafe fn shared_from(hwnd: HWND) -> Option<&'static WindowShared> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const WindowShared;
    if ptr.is_null() {
        None
    } else {
        Some(&*ptr)
    }
}

unsafe fn apply_affinity(hwnd: HWND, excluded: bool) {
    let affinity = if excluded { WDA_EXCLUDEFROMCAPTURE } else { WDA_NONE };
    if let Err(e) = SetWindowDisplayAffinity(hwnd, affinity) {
        // Older Windows builds reject WDA_EXCLUDEFROMCAPTURE; the overlay
        // then simply stays visible in captures.
        log::debug!("[WIN32] SetWindowDisplayAffinity failed: {}", e);
    }
}

unsafe fn pin_topmost(hwnd: HWND) {
    let _ = SetWindowPos(
        hwnd,
        HWND_TOPMOST,
        0,
        0,
        0,
        0,
        SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
    );
}

unsafe fn paint(hwnd: HWND) {
    let mut ps = PAINTSTRUCT::default();
    let hdc = BeginPaint(hwnd, &mut ps);

    let mut rect = RECT::default();
    let _ = GetClientRect(hwnd, &mut rect);
    rect.left += CONTENT_PADDING;
    rect.top += CONTENT_PADDING;
    rect.right -= CONTENT_PADDING;
    rect.bottom -= CONTENT_PADDING;

    SetBkMode(hdc, TRANSPARENT);
    SetTextColor(hdc, TEXT_COLOR);

    let display = {
        match shared_from(hwnd) {
            Some(shared) => {
                let (text, loading) = shared.content.lock().unwrap().clone();
                if loading {
                    format!("{}\n\n[ working ]", text)
                } else {
                    text
                }
            }
            None => String::new(),
        }
    };
    let mut wide: Vec<u16> = display.encode_utf16().collect();
    DrawTextW(hdc, &mut wide, &mut rect, DT_WORDBREAK | DT_NOPREFIX);

    let _ = EndPaint(hwnd, &ps);
}

unsafe extern "system" fn wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCCREATE => {
            let cs = lparam.0 as *const CREATESTRUCTW;
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, (*cs).lpCreateParams as isize);
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        MSG_SET_VISIBLE => {
            let show = wparam.0 != 0;
            // SW_SHOWNA: present the result without stealing focus from
            // whatever the user is working in.
            let _ = ShowWindow(hwnd, if show { SW_SHOWNA } else { SW_HIDE });
            LRESULT(0)
        }
        MSG_CONTENT_CHANGED => {
            let _ = InvalidateRect(hwnd, None, true);
            LRESULT(0)
        }
        MSG_SET_AFFINITY => {
            let excluded = wparam.0 != 0;
            apply_affinity(hwnd, excluded);
            if excluded {
                pin_topmost(hwnd);
            }
            LRESULT(0)
        }
        MSG_RAISE => {
            pin_topmost(hwnd);
            LRESULT(0)
        }
        MSG_UNREGISTER_HOTKEY => {
            let _ = UnregisterHotKey(hwnd, HOTKEY_ID);
            LRESULT(0)
        }
        MSG_QUIT => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }
        WM_HOTKEY => {
            if wparam.0 as i32 == HOTKEY_ID {
                if let Some(shared) = shared_from(hwnd) {
                    let _ = shared.toggle.send(());
                }
            }
            LRESULT(0)
        }
        WM_PAINT => {
            paint(hwnd);
            LRESULT(0)
        }
        WM_CLOSE => {
            // The close button dismisses the overlay; the process itself
            // stays resident until interrupted.
            let _ = ShowWindow(hwnd, SW_HIDE);
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        WM_NCDESTROY => {
            let ptr = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *const WindowShared;
            if !ptr.is_null() {
                drop(Arc::from_raw(ptr));
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
