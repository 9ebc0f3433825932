//! C ABI entry points.
//!
//! # Contract
//! - Strings are NUL-terminated UTF-8 (`const char*`), borrowed for the
//!   duration of the call only
//! - The payload is `(ptr, len)`; a null pointer is accepted when `len == 0`
//! - Status `0` is success and `1` is failure; causes only go to the logs
//! - A successful read hands the caller a buffer of `len` bytes followed by
//!   a NUL terminator. It must be released exactly once with
//!   [`ledger_bridge_free_buffer`] passing the same `ptr` and `len`
//! - A failed read yields a null buffer and zero length
//! - No panic crosses the boundary
//!
//! See `include/ledger_bridge.h` for the C declarations.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use crate::bridge::{self, CallParams};
use crate::config::GatewayTimeouts;
use crate::error::{BridgeError, BridgeResult, STATUS_FAILURE, STATUS_SUCCESS};
use crate::observability::init_logging;

/// Result of [`ledger_bridge_read`].
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct LedgerReadResult {
    pub ptr: *mut u8,
    pub len: usize,
    pub status: c_int,
}

impl LedgerReadResult {
    fn failure() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            status: STATUS_FAILURE,
        }
    }

    fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        let mut terminated = bytes;
        terminated.push(0);
        let raw = Box::into_raw(terminated.into_boxed_slice());
        Self {
            ptr: raw as *mut u8,
            len,
            status: STATUS_SUCCESS,
        }
    }
}

/// Submit `function(payload)` and wait for the commit.
///
/// Returns `0` once the transaction committed as valid, `1` otherwise.
///
/// # Safety
/// Every string argument must be null or a valid NUL-terminated string.
/// `payload` must be null or point to `payload_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn ledger_bridge_write(
    payload: *const u8,
    payload_len: usize,
    function: *const c_char,
    network: *const c_char,
    contract: *const c_char,
    msp_id: *const c_char,
    cert_path: *const c_char,
    key_dir: *const c_char,
    trust_anchor_path: *const c_char,
    peer_endpoint: *const c_char,
    peer_name: *const c_char,
) -> c_int {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let params = call_params(
            payload,
            payload_len,
            [
                function,
                network,
                contract,
                msp_id,
                cert_path,
                key_dir,
                trust_anchor_path,
                peer_endpoint,
                peer_name,
            ],
        )?;
        bridge::write(&params, &GatewayTimeouts::default(), false)
    }));

    match outcome {
        Ok(Ok(_)) => STATUS_SUCCESS,
        Ok(Err(e)) => {
            report_rejected_input(&e);
            e.status_code()
        }
        Err(_) => {
            tracing::error!("Panic caught in ledger_bridge_write");
            STATUS_FAILURE
        }
    }
}

/// Evaluate `function(payload)` and return the peer's response payload.
///
/// # Safety
/// Same argument requirements as [`ledger_bridge_write`]. A returned buffer
/// must be released with [`ledger_bridge_free_buffer`].
#[no_mangle]
pub unsafe extern "C" fn ledger_bridge_read(
    payload: *const u8,
    payload_len: usize,
    function: *const c_char,
    network: *const c_char,
    contract: *const c_char,
    msp_id: *const c_char,
    cert_path: *const c_char,
    key_dir: *const c_char,
    trust_anchor_path: *const c_char,
    peer_endpoint: *const c_char,
    peer_name: *const c_char,
) -> LedgerReadResult {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let params = call_params(
            payload,
            payload_len,
            [
                function,
                network,
                contract,
                msp_id,
                cert_path,
                key_dir,
                trust_anchor_path,
                peer_endpoint,
                peer_name,
            ],
        )?;
        bridge::read(&params, &GatewayTimeouts::default(), false)
    }));

    match outcome {
        Ok(Ok(bytes)) => LedgerReadResult::from_bytes(bytes),
        Ok(Err(e)) => {
            report_rejected_input(&e);
            LedgerReadResult::failure()
        }
        Err(_) => {
            tracing::error!("Panic caught in ledger_bridge_read");
            LedgerReadResult::failure()
        }
    }
}

/// Release a buffer returned by [`ledger_bridge_read`].
///
/// # Safety
/// `ptr` and `len` must be exactly the values of one successful read, and
/// the buffer must not be used or released again afterwards. A null `ptr`
/// is ignored.
#[no_mangle]
pub unsafe extern "C" fn ledger_bridge_free_buffer(ptr: *mut u8, len: usize) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len + 1)));
    }
}

/// Install a log subscriber filtered by `RUST_LOG` or `filter`.
///
/// Returns `0` when installed, `1` when a subscriber already existed or the
/// filter string was unusable.
///
/// # Safety
/// `filter` must be null or a valid NUL-terminated string. Null selects `info`.
#[no_mangle]
pub unsafe extern "C" fn ledger_bridge_init_logging(filter: *const c_char) -> c_int {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let filter = if filter.is_null() {
            "info"
        } else {
            match CStr::from_ptr(filter).to_str() {
                Ok(s) => s,
                Err(_) => return false,
            }
        };
        init_logging(filter)
    }));

    match outcome {
        Ok(true) => STATUS_SUCCESS,
        _ => STATUS_FAILURE,
    }
}

/// Argument names in the order the entry points take them.
const STRING_ARGUMENTS: [&str; 9] = [
    "function",
    "network",
    "contract",
    "msp_id",
    "cert_path",
    "key_dir",
    "trust_anchor_path",
    "peer_endpoint",
    "peer_name",
];

unsafe fn call_params<'a>(
    payload: *const u8,
    payload_len: usize,
    strings: [*const c_char; 9],
) -> BridgeResult<CallParams<'a>> {
    let payload: &'a [u8] = if payload_len == 0 {
        &[]
    } else if payload.is_null() {
        return Err(BridgeError::InvalidInput(format!(
            "payload is null but payload_len is {}",
            payload_len
        )));
    } else {
        std::slice::from_raw_parts(payload, payload_len)
    };

    let mut values = [""; 9];
    for (slot, (raw, name)) in values.iter_mut().zip(strings.iter().zip(STRING_ARGUMENTS)) {
        *slot = c_str(*raw, name)?;
    }
    let [
        function,
        network,
        contract,
        msp_id,
        cert_path,
        key_dir,
        trust_anchor_path,
        peer_endpoint,
        peer_name,
    ] = values;

    Ok(CallParams {
        payload,
        function,
        network,
        contract,
        msp_id,
        cert_path,
        key_dir,
        trust_anchor_path,
        peer_endpoint,
        peer_name,
    })
}

unsafe fn c_str<'a>(raw: *const c_char, name: &str) -> BridgeResult<&'a str> {
    if raw.is_null() {
        return Err(BridgeError::InvalidInput(format!("{} is null", name)));
    }
    CStr::from_ptr(raw)
        .to_str()
        .map_err(|_| BridgeError::InvalidInput(format!("{} is not valid UTF-8", name)))
}

/// Bridge failures are logged by the bridge itself; argument rejections
/// happen before it runs.
fn report_rejected_input(error: &BridgeError) {
    if let BridgeError::InvalidInput(message) = error {
        tracing::error!(error = %message, "Rejected call arguments");
    }
}
