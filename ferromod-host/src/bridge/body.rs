use super::{span, write_out};
use crate::buffer::Buffer;
use ferromod_abi::BodyHandle;
use std::ptr;

/// # Safety
/// A non-null handle must point at a live `Buffer`.
unsafe fn buffer<'a, B: BodyHandle>(body: B) -> Option<&'a mut Buffer> {
    // SAFETY: guaranteed by the caller.
    unsafe { body.as_raw().cast::<Buffer>().as_mut() }
}

pub(super) unsafe extern "C" fn slices_count<B: BodyHandle>(body: B) -> usize {
    // SAFETY: the module passes a live buffer handle or null.
    unsafe { buffer(body) }.map_or(0, |b| b.slice_count())
}

pub(super) unsafe extern "C" fn slice<B: BodyHandle>(
    body: B,
    nth: usize,
    out_ptr: *mut *mut u8,
    out_len: *mut usize,
) {
    // SAFETY: as in `slices_count`.
    let slice = unsafe { buffer(body) }.and_then(|b| b.slice_mut(nth));
    let (data, len) = slice.map_or((ptr::null_mut(), 0), |s| (s.as_mut_ptr(), s.len()));
    // SAFETY: out-parameters are module-owned and writable, or null.
    unsafe {
        write_out(out_ptr, data);
        write_out(out_len, len);
    }
}

pub(super) unsafe extern "C" fn length<B: BodyHandle>(body: B) -> usize {
    // SAFETY: as in `slices_count`.
    unsafe { buffer(body) }.map_or(0, |b| b.len())
}

pub(super) unsafe extern "C" fn append<B: BodyHandle>(body: B, data: *const u8, len: usize) {
    // SAFETY: as in `slices_count`; `data` is null or a readable span.
    if let (Some(b), Some(data)) = unsafe { (buffer(body), span(data, len)) } {
        b.add(data);
    }
}

pub(super) unsafe extern "C" fn prepend<B: BodyHandle>(body: B, data: *const u8, len: usize) {
    // SAFETY: as in `append`.
    if let (Some(b), Some(data)) = unsafe { (buffer(body), span(data, len)) } {
        b.prepend(data);
    }
}

pub(super) unsafe extern "C" fn drain<B: BodyHandle>(body: B, n: usize) {
    // SAFETY: as in `slices_count`.
    if let Some(b) = unsafe { buffer(body) } {
        b.drain(n);
    }
}

pub(super) unsafe extern "C" fn copy_out<B: BodyHandle>(
    body: B,
    offset: usize,
    length: usize,
    dest: *mut u8,
) {
    if length == 0 || dest.is_null() {
        return;
    }
    // SAFETY: as in `slices_count`.
    let Some(b) = (unsafe { buffer(body) }) else {
        return;
    };
    // SAFETY: the module guarantees `dest` is writable for `length` bytes.
    let dest = unsafe { std::slice::from_raw_parts_mut(dest, length) };
    b.copy_out(offset, dest);
}
