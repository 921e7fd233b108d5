//! C ABI subset over [`Session`]: opaque handles plus plain-old-data
//! in/out parameters, in the style `vcpu-interop` uses for its processor
//! and memory handles.

use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::slice;

use crate::result::Fv1Result;
use crate::util::{destroy, into_ptr};
use crate::Session;

thread_local! {
    static LAST_ERROR: Cell<CString> = Cell::new(Default::default());
}

fn set_last_error(message: String) {
    LAST_ERROR.with(|slot| {
        let c_string = CString::new(message).unwrap_or_default();
        slot.set(c_string);
    });
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_create() -> *mut Session {
    into_ptr(Session::new())
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_destroy(session: *mut Session) {
    destroy(session)
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_assemble(session: *mut Session, source: *const c_char) -> Fv1Result {
    let source = match CStr::from_ptr(source).to_str() {
        Ok(s) => s,
        Err(_) => return Fv1Result::Utf8Error,
    };

    if (*session).assemble_and_load(source) {
        Fv1Result::Ok
    } else {
        let message = (*session)
            .diagnostics()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        set_last_error(message);
        Fv1Result::AssemblyFailed
    }
}

#[no_mangle]
pub unsafe extern "C" fn fv1_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| {
        let value = slot.take();
        let ptr = value.as_ptr();
        slot.set(value);
        ptr
    })
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_process_sample(
    session: *mut Session,
    left_in: f32,
    right_in: f32,
    pot0: f32,
    pot1: f32,
    pot2: f32,
    left_out: *mut f32,
    right_out: *mut f32,
) {
    let (l, r) = (*session).process_sample(left_in, right_in, pot0, pot1, pot2);
    *left_out = l;
    *right_out = r;
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_process_block(
    session: *mut Session,
    left_in: *const f32,
    right_in: *const f32,
    len: usize,
    pot0: f32,
    pot1: f32,
    pot2: f32,
    left_out: *mut f32,
    right_out: *mut f32,
) {
    let left_in = slice::from_raw_parts(left_in, len);
    let right_in = slice::from_raw_parts(right_in, len);
    let (left, right) = (*session).process_block(left_in, right_in, pot0, pot1, pot2);
    slice::from_raw_parts_mut(left_out, len).copy_from_slice(&left);
    slice::from_raw_parts_mut(right_out, len).copy_from_slice(&right);
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_step(session: *mut Session) -> i64 {
    match (*session).step() {
        fv1::StepOutcome::Continued => -1,
        fv1::StepOutcome::Breakpoint(pc) => pc as i64,
    }
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_add_breakpoint(session: *mut Session, address: usize) {
    (*session).add_breakpoint(address);
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_remove_breakpoint(session: *mut Session, address: usize) {
    (*session).remove_breakpoint(address);
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_get_register(session: *const Session, index: u8) -> f64 {
    (*session).register(index)
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_set_register(session: *mut Session, index: u8, value: f64) {
    (*session).set_register(index, value);
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_get_acc(session: *const Session) -> f64 {
    (*session).acc()
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_set_acc(session: *mut Session, value: f64) {
    (*session).set_acc(value);
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_get_pc(session: *const Session) -> usize {
    (*session).pc()
}

#[no_mangle]
pub unsafe extern "C" fn fv1_session_evaluate(
    session: *const Session,
    expression: *const c_char,
    out: *mut f64,
) -> Fv1Result {
    let expression = match CStr::from_ptr(expression).to_str() {
        Ok(s) => s,
        Err(_) => return Fv1Result::Utf8Error,
    };
    match (*session).evaluate(expression) {
        Ok(value) => {
            *out = value;
            Fv1Result::Ok
        }
        Err(message) => {
            set_last_error(message);
            Fv1Result::OutOfRange
        }
    }
}
