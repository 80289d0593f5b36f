//! Win32 window creation and the window procedure.

use std::ptr::NonNull;

use eyre::eyre;
use tracing::debug;
use tracing::warn;
use widestring::U16CString;
use windows::core::w;
use windows::core::PCWSTR;
use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::signed_dimension;
use crate::error::EngineResult;
use crate::error::HresultContext;
use crate::input::InputEvent;
use crate::input::InputState;
use crate::input::MouseButton;

pub trait WindowHandler {
    /// The name of the window class.
    const CLASS_NAME: PCWSTR;

    /// Returns true when the message is fully handled and `DefWindowProcW`
    /// must not see it.
    fn handle(&mut self, window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> bool;
}

pub fn create_window_class<H: WindowHandler>(instance: HMODULE) -> EngineResult<WNDCLASSEXW> {
    // WNDCLASSEXW - https://learn.microsoft.com/en-us/windows/win32/api/winuser/ns-winuser-wndclassexw
    Ok(WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wndproc::<H>),
        hInstance: instance.into(),
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.context("Failed to load cursor.")?,
        lpszClassName: H::CLASS_NAME,
        ..Default::default()
    })
}

/// Atom returned by `RegisterClassExW`.
pub struct ClassAtom(u16);

impl ClassAtom {
    /// Equivalent to the MAKEINTATOM macro: the atom in the low word of a
    /// string pointer.
    ///
    /// https://learn.microsoft.com/en-us/windows/win32/api/winbase/nf-winbase-makeintatom
    pub fn as_pcwstr(&self) -> PCWSTR {
        PCWSTR(self.0 as usize as *const u16)
    }
}

pub fn register_window_class(class: &WNDCLASSEXW) -> EngineResult<ClassAtom> {
    let atom = unsafe { RegisterClassExW(class) };
    if atom == 0 {
        return Err(windows::core::Error::from_win32().into());
    }
    Ok(ClassAtom(atom))
}

/// Heap allocation shared between the owner and the window procedure.
///
/// Every access, from either side, goes through the one raw pointer taken at
/// construction, so no `Box` or `&mut` held elsewhere is invalidated by the
/// procedure's writes. Must outlive any window created with it.
pub struct HandlerCell<H> {
    ptr: NonNull<H>,
}

impl<H> HandlerCell<H> {
    pub fn new(handler: H) -> Self {
        Self {
            ptr: NonNull::from(Box::leak(Box::new(handler))),
        }
    }

    pub fn as_ptr(&self) -> *mut H {
        self.ptr.as_ptr()
    }

    /// Only sound while no message is being dispatched to the window.
    pub fn get(&self) -> &H {
        unsafe { self.ptr.as_ref() }
    }

    /// Only sound while no message is being dispatched to the window.
    pub fn get_mut(&mut self) -> &mut H {
        unsafe { self.ptr.as_mut() }
    }
}

impl<H> Drop for HandlerCell<H> {
    fn drop(&mut self) {
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}

pub struct Window {
    hwnd: HWND,
}

impl Window {
    /// Creates a `WS_OVERLAPPEDWINDOW` whose client area is `client_size`.
    ///
    /// `handler` receives every message for the window's lifetime, so it must
    /// outlive the returned [`Window`].
    pub fn create<H: WindowHandler>(
        instance: HMODULE,
        class: &ClassAtom,
        client_size: (u32, u32),
        title: &str,
        handler: &HandlerCell<H>,
    ) -> EngineResult<Self> {
        let mut window_rect = RECT {
            left: 0,
            top: 0,
            right: signed_dimension(client_size.0)?,
            bottom: signed_dimension(client_size.1)?,
        };
        unsafe { AdjustWindowRect(&mut window_rect, WS_OVERLAPPEDWINDOW, false) }
            .context("Failed to adjust window rect.")?;

        let title = U16CString::from_str(title)
            .map_err(|e| eyre!("Window title contains a nul character: {e}"))?;

        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                class.as_pcwstr(),
                PCWSTR(title.as_ptr()),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                window_rect.right - window_rect.left,
                window_rect.bottom - window_rect.top,
                None,
                None,
                Some(instance.into()),
                Some(handler.as_ptr() as _),
            )
        }
        .context("Failed to create window.")?;

        debug!(
            "Created window {:?} with client area {}x{}",
            hwnd, client_size.0, client_size.1
        );
        Ok(Self { hwnd })
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    pub fn show(&self) {
        unsafe { _ = ShowWindow(self.hwnd, SW_NORMAL) };
    }

    pub fn client_size(&self) -> EngineResult<(u32, u32)> {
        client_size(self.hwnd)
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if unsafe { IsWindow(Some(self.hwnd)) }.as_bool() {
            if let Err(e) = unsafe { DestroyWindow(self.hwnd) } {
                warn!("DestroyWindow failed: {e}");
            }
        }
    }
}

pub fn client_size(hwnd: HWND) -> EngineResult<(u32, u32)> {
    let mut rect = RECT::default();
    unsafe { GetClientRect(hwnd, &mut rect) }.context("Failed to get client rect.")?;
    Ok((
        (rect.right - rect.left).max(0) as u32,
        (rect.bottom - rect.top).max(0) as u32,
    ))
}

// A panic must not unwind across the FFI boundary.
fn safe_handle<H: WindowHandler>(
    handler: &mut H,
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> bool {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        handler.handle(window, message, wparam, lparam)
    }))
    .unwrap_or(false)
}

extern "system" fn wndproc<H: WindowHandler>(
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if message == WM_CREATE {
        unsafe {
            let create_struct: &CREATESTRUCTW = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(window, GWLP_USERDATA, create_struct.lpCreateParams as _);
        }
        return LRESULT(0);
    }

    let user_data = unsafe { GetWindowLongPtrW(window, GWLP_USERDATA) };
    let Some(mut handler) = NonNull::<H>::new(user_data as *mut H) else {
        // Messages can arrive before WM_CREATE.
        return unsafe { DefWindowProcW(window, message, wparam, lparam) };
    };

    let handled = safe_handle(unsafe { handler.as_mut() }, window, message, wparam, lparam);

    match message {
        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        WM_NCDESTROY => {
            unsafe { SetWindowLongPtrW(window, GWLP_USERDATA, 0) };
            unsafe { DefWindowProcW(window, message, wparam, lparam) }
        }
        _ if handled => LRESULT(0),
        _ => unsafe { DefWindowProcW(window, message, wparam, lparam) },
    }
}

// HIWORD(wParam) of WM_XBUTTON* and LOWORD(wParam) of WM_ACTIVATE.
const XBUTTON1_ID: u16 = 0x0001;
const ACTIVATE_INACTIVE: u16 = 0;

fn low_word(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

fn high_word(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

/// Client coordinates packed in a mouse message's LPARAM; they go negative
/// while the mouse is captured outside the window.
fn mouse_position(lparam: LPARAM) -> (i32, i32) {
    let raw = lparam.0 as usize;
    (low_word(raw) as i16 as i32, high_word(raw) as i16 as i32)
}

fn x_button(wparam: WPARAM) -> MouseButton {
    if high_word(wparam.0) == XBUTTON1_ID {
        MouseButton::X1
    } else {
        MouseButton::X2
    }
}

/// Maps keyboard, mouse and focus messages onto [`InputEvent`]s.
pub fn translate_input(message: u32, wparam: WPARAM, lparam: LPARAM) -> Option<InputEvent> {
    let event = match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => InputEvent::KeyDown(wparam.0 as u8),
        WM_KEYUP | WM_SYSKEYUP => InputEvent::KeyUp(wparam.0 as u8),
        WM_MOUSEMOVE => {
            let (x, y) = mouse_position(lparam);
            InputEvent::MouseMove { x, y }
        }
        WM_LBUTTONDOWN => InputEvent::ButtonDown(MouseButton::Left),
        WM_LBUTTONUP => InputEvent::ButtonUp(MouseButton::Left),
        WM_RBUTTONDOWN => InputEvent::ButtonDown(MouseButton::Right),
        WM_RBUTTONUP => InputEvent::ButtonUp(MouseButton::Right),
        WM_MBUTTONDOWN => InputEvent::ButtonDown(MouseButton::Middle),
        WM_MBUTTONUP => InputEvent::ButtonUp(MouseButton::Middle),
        WM_XBUTTONDOWN => InputEvent::ButtonDown(x_button(wparam)),
        WM_XBUTTONUP => InputEvent::ButtonUp(x_button(wparam)),
        WM_MOUSEWHEEL => InputEvent::Wheel(high_word(wparam.0) as i16 as i32),
        WM_ACTIVATE if low_word(wparam.0) == ACTIVATE_INACTIVE => InputEvent::FocusLost,
        _ => return None,
    };
    Some(event)
}

/// State the window procedure hands over to the application loop.
#[derive(Debug, Default)]
pub struct WindowEvents {
    pub input: InputState,
    in_size_move: bool,
    pending_resize: Option<(u32, u32)>,
    destroyed: bool,
}

impl WindowEvents {
    pub fn in_size_move(&self) -> bool {
        self.in_size_move
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The client size reported when the last move/resize loop ended, if it
    /// has not been consumed yet.
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.pending_resize.take()
    }
}

impl WindowHandler for WindowEvents {
    const CLASS_NAME: PCWSTR = w!("D3D12EngineClass");

    fn handle(&mut self, window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> bool {
        if let Some(event) = translate_input(message, wparam, lparam) {
            self.input.apply(event);
            // Still let DefWindowProcW see it, Alt+F4 included.
            return false;
        }

        match message {
            WM_ENTERSIZEMOVE => {
                self.in_size_move = true;
                false
            }
            WM_EXITSIZEMOVE => {
                self.in_size_move = false;
                match client_size(window) {
                    Ok(size) => self.pending_resize = Some(size),
                    Err(e) => warn!("Could not read client size after resize: {e}"),
                }
                false
            }
            WM_DESTROY => {
                self.destroyed = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_cell_shares_one_allocation() {
        let mut cell = HandlerCell::new(WindowEvents::default());
        let raw = cell.as_ptr();
        // What the window procedure does with the pointer it was handed.
        unsafe { (*raw).input.apply(InputEvent::KeyDown(b'W')) };
        assert!(cell.get().input.keyboard.is_key_down(b'W'));

        cell.get_mut().input.apply(InputEvent::FocusLost);
        assert!(!unsafe { &*raw }.input.keyboard.is_key_down(b'W'));
        assert_eq!(cell.as_ptr(), raw);
    }

    #[test]
    fn mouse_coordinates_are_signed() {
        let lparam = LPARAM(((-5i16 as u16 as isize) << 16) | 12);
        assert_eq!(
            translate_input(WM_MOUSEMOVE, WPARAM(0), lparam),
            Some(InputEvent::MouseMove { x: 12, y: -5 })
        );
    }

    #[test]
    fn wheel_delta_comes_from_the_high_word() {
        let wparam = WPARAM((((-120i16) as u16 as usize) << 16) | 0x0008);
        assert_eq!(
            translate_input(WM_MOUSEWHEEL, wparam, LPARAM(0)),
            Some(InputEvent::Wheel(-120))
        );
    }

    #[test]
    fn x_buttons_and_focus() {
        let second = WPARAM(2 << 16);
        assert_eq!(
            translate_input(WM_XBUTTONDOWN, second, LPARAM(0)),
            Some(InputEvent::ButtonDown(MouseButton::X2))
        );
        assert_eq!(
            translate_input(WM_ACTIVATE, WPARAM(0), LPARAM(0)),
            Some(InputEvent::FocusLost)
        );
        assert_eq!(translate_input(WM_ACTIVATE, WPARAM(1), LPARAM(0)), None);
        assert_eq!(translate_input(WM_PAINT, WPARAM(0), LPARAM(0)), None);
    }
}
