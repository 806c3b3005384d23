//! macOS pointer executor via CGEventPost.
//!
//! `MacOSExecutor` implements `PointerExecutor`. Quartz has no relative
//! motion event, so each move reads the current cursor location, offsets it
//! and posts a `kCGEventMouseMoved` at the HID level with the delta fields
//! filled in. `CGEventPost` delivers the event before returning.

use std::ffi::{c_char, c_void, CStr};

use crate::platform::{PlatformError, PointerExecutor};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// CGEventTapLocation: kCGHIDEventTap. Events posted here reset the HID
/// idle timer the same way physical input does.
const CG_HID_EVENT_TAP: u32 = 0;

/// kCGEventSourceStateHIDSystemState = 1 -- use the real HID hardware state.
const CG_EVENT_SOURCE_STATE_HID_SYSTEM_STATE: i32 = 1;

/// CGEventType: kCGEventMouseMoved.
const CG_EVENT_MOUSE_MOVED: u32 = 5;

/// CGMouseButton: kCGMouseButtonLeft (ignored for move events).
const CG_MOUSE_BUTTON_LEFT: u32 = 0;

/// CGEventField: kCGMouseEventDeltaX / kCGMouseEventDeltaY.
const CG_MOUSE_EVENT_DELTA_X: u32 = 4;
const CG_MOUSE_EVENT_DELTA_Y: u32 = 5;

/// kCFStringEncodingUTF8.
const CF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;

/// kIOPMAssertionLevelOn.
const IOPM_ASSERTION_LEVEL_ON: u32 = 255;

/// kIOReturnSuccess.
const IO_RETURN_SUCCESS: i32 = 0;

const ASSERTION_TYPE: &CStr = c"PreventUserIdleDisplaySleep";
const ASSERTION_NAME: &CStr = c"wiggled keeping the session awake";

// ---------------------------------------------------------------------------
// Raw FFI
// ---------------------------------------------------------------------------

type CGEventRef = *mut c_void;
type CGEventSourceRef = *mut c_void;
type CFStringRef = *const c_void;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct CGPoint {
    x: f64,
    y: f64,
}

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn CGEventSourceCreate(state_id: i32) -> CGEventSourceRef;
    fn CGEventCreate(source: CGEventSourceRef) -> CGEventRef;
    fn CGEventGetLocation(event: CGEventRef) -> CGPoint;
    fn CGEventCreateMouseEvent(
        source: CGEventSourceRef,
        mouse_type: u32,
        location: CGPoint,
        button: u32,
    ) -> CGEventRef;
    fn CGEventSetIntegerValueField(event: CGEventRef, field: u32, value: i64);
    fn CGEventPost(tap_location: u32, event: CGEventRef);
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFRelease(cf: *const c_void);
    fn CFStringCreateWithCString(
        alloc: *const c_void,
        c_str: *const c_char,
        encoding: u32,
    ) -> CFStringRef;
}

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOPMAssertionCreateWithName(
        assertion_type: CFStringRef,
        level: u32,
        name: CFStringRef,
        assertion_id: *mut u32,
    ) -> i32;
    fn IOPMAssertionRelease(assertion_id: u32) -> i32;
}

// ---------------------------------------------------------------------------
// Public struct
// ---------------------------------------------------------------------------

/// Injects pointer motion via CGEventPost on macOS.
///
/// Holds the IOKit assertion ID while idle suppression is on.
pub struct MacOSExecutor {
    assertion: Option<u32>,
}

impl MacOSExecutor {
    pub fn new() -> Self {
        MacOSExecutor { assertion: None }
    }
}

impl Default for MacOSExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MacOSExecutor {
    fn drop(&mut self) {
        if let Some(id) = self.assertion.take() {
            unsafe { IOPMAssertionRelease(id) };
        }
    }
}

fn offset(point: CGPoint, dx: i32, dy: i32) -> CGPoint {
    CGPoint {
        x: point.x + f64::from(dx),
        y: point.y + f64::from(dy),
    }
}

fn cf_string(s: &CStr) -> Result<CFStringRef, PlatformError> {
    let cf = unsafe {
        CFStringCreateWithCString(std::ptr::null(), s.as_ptr(), CF_STRING_ENCODING_UTF8)
    };
    if cf.is_null() {
        return Err(PlatformError::Other(
            "CFStringCreateWithCString returned null".into(),
        ));
    }
    Ok(cf)
}

// ---------------------------------------------------------------------------
// PointerExecutor trait impl
// ---------------------------------------------------------------------------

impl PointerExecutor for MacOSExecutor {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PlatformError> {
        unsafe {
            let source = CGEventSourceCreate(CG_EVENT_SOURCE_STATE_HID_SYSTEM_STATE);
            if source.is_null() {
                return Err(PlatformError::Other(
                    "CGEventSourceCreate returned null".into(),
                ));
            }

            // A blank event carries the current cursor location.
            let blank = CGEventCreate(std::ptr::null_mut());
            if blank.is_null() {
                CFRelease(source.cast::<c_void>());
                return Err(PlatformError::Other("CGEventCreate returned null".into()));
            }
            let current = CGEventGetLocation(blank);
            CFRelease(blank.cast::<c_void>());

            let event = CGEventCreateMouseEvent(
                source,
                CG_EVENT_MOUSE_MOVED,
                offset(current, dx, dy),
                CG_MOUSE_BUTTON_LEFT,
            );
            if event.is_null() {
                CFRelease(source.cast::<c_void>());
                return Err(PlatformError::Other(
                    "CGEventCreateMouseEvent returned null".into(),
                ));
            }

            CGEventSetIntegerValueField(event, CG_MOUSE_EVENT_DELTA_X, i64::from(dx));
            CGEventSetIntegerValueField(event, CG_MOUSE_EVENT_DELTA_Y, i64::from(dy));
            CGEventPost(CG_HID_EVENT_TAP, event);
            CFRelease(event.cast::<c_void>());
            CFRelease(source.cast::<c_void>());
        }

        log::trace!("executor: moved pointer by ({dx}, {dy})");
        Ok(())
    }

    fn set_idle_suppression(&mut self, enabled: bool) -> Result<(), PlatformError> {
        match (enabled, self.assertion) {
            (true, Some(_)) | (false, None) => Ok(()),
            (true, None) => {
                let kind = cf_string(ASSERTION_TYPE)?;
                let name = match cf_string(ASSERTION_NAME) {
                    Ok(name) => name,
                    Err(e) => {
                        unsafe { CFRelease(kind) };
                        return Err(e);
                    }
                };

                let mut id: u32 = 0;
                let rc = unsafe {
                    IOPMAssertionCreateWithName(kind, IOPM_ASSERTION_LEVEL_ON, name, &mut id)
                };
                unsafe {
                    CFRelease(kind);
                    CFRelease(name);
                }

                if rc != IO_RETURN_SUCCESS {
                    return Err(PlatformError::Other(format!(
                        "IOPMAssertionCreateWithName failed: {rc:#x}"
                    )));
                }
                self.assertion = Some(id);
                log::debug!("executor: idle suppression on (assertion {id})");
                Ok(())
            }
            (false, Some(id)) => {
                self.assertion = None;
                let rc = unsafe { IOPMAssertionRelease(id) };
                if rc != IO_RETURN_SUCCESS {
                    return Err(PlatformError::Other(format!(
                        "IOPMAssertionRelease failed: {rc:#x}"
                    )));
                }
                log::debug!("executor: idle suppression off");
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_adds_delta() {
        let p = CGPoint { x: 100.5, y: 20.0 };
        assert_eq!(offset(p, 4, -3), CGPoint { x: 104.5, y: 17.0 });
    }

    #[test]
    fn release_without_assertion_is_noop() {
        let mut executor = MacOSExecutor::default();
        assert!(executor.set_idle_suppression(false).is_ok());
        assert!(executor.assertion.is_none());
    }
}
