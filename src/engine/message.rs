use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;

use super::Engine;

/// Owned engine diagnostic, freed through the engine exactly once on drop.
pub(crate) struct EngineMessage<'e, E: Engine> {
    engine: &'e E,
    ptr: *mut c_char,
}

impl<'e, E: Engine> EngineMessage<'e, E> {
    /// Take ownership of whatever `exec` left in `slot`, resetting the slot to null.
    ///
    /// # Safety
    ///
    /// `*slot` must be null or a live diagnostic allocated by `engine`.
    pub(crate) unsafe fn take(engine: &'e E, slot: &mut *mut c_char) -> Self {
        Self {
            engine,
            ptr: std::mem::replace(slot, ptr::null_mut()),
        }
    }

    /// Copy of the diagnostic text, `None` when the engine left no message.
    pub(crate) fn text(&self) -> Option<String> {
        if self.ptr.is_null() {
            return None;
        }
        // SAFETY: non-null pointers come from the engine as NUL-terminated strings
        // and stay alive until this guard is dropped.
        let text = unsafe { CStr::from_ptr(self.ptr) };
        Some(text.to_string_lossy().into_owned())
    }
}

impl<E: Engine> Drop for EngineMessage<'_, E> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: `take` guarantees the pointer is engine-owned and unfreed.
            unsafe { self.engine.free_message(self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}
