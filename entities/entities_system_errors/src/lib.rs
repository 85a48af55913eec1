//! Entities Layer: System Errors
//!
//! Provides the error-reporting protocol shared by every wrapped system call
//! in the workspace.
//!
//! ## Overview
//!
//! A wrapped call detects failure at its system-call boundary and hands the
//! error to an [`ErrorSink`]. The sink type, chosen by the caller, decides what
//! happens next:
//!
//! - **[`Throw`]**: the call returns `Result<T, OsError>`; the error carries a
//!   formatted message describing the failed call.
//! - **`&mut` [`ErrorCode`]**: the code is stored in the caller's cell and the
//!   call returns its empty/zero value. No message is ever formatted.
//! - **`&mut` [`ErrorReport`]**: like `ErrorCode`, but keeps the whole
//!   [`OsError`] including its message.
//! - **`&mut` [`AllowedErrors`]**: expected codes are stored, anything else is
//!   escalated to the `Throw` path.
//!
//! Dispatch is resolved at compile time through the sink's associated
//! `Output<T>` type.
//!
//! ## Modules
//!
//! - **[`code`](code/index.html)**: the `(domain, code)` error value
//! - **[`platform_map`](platform_map/index.html)**: Win32/Winsock to POSIX translation table
//! - **[`os_error`](os_error/index.html)**: the structured error
//! - **[`sink`](sink/index.html)**: the sink protocol and built-in sinks
//! - **[`allowed`](allowed/index.html)**: the allow-list sink
//!
//! ## Usage
//!
//! ```rust
//! use entities_system_errors::{ErrorCode, ErrorSink, SystemError, Throw};
//!
//! fn checked_call<S: ErrorSink>(ret: i32, sink: S) -> S::Output<i32> {
//!     if ret < 0 {
//!         return sink.fail(SystemError::posix(libc::EINVAL), 0, || format!("call({}) failed", ret));
//!     }
//!     sink.succeed(ret)
//! }
//!
//! assert!(checked_call(-1, Throw).is_err());
//!
//! let mut ec = ErrorCode::new();
//! assert_eq!(checked_call(-1, &mut ec), 0);
//! assert!(ec.failed());
//! ```

/*
 * %CopyrightBegin%
 *
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright POSIX Bindings Contributors 2026. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * %CopyrightEnd%
 */

pub mod allowed;
pub mod code;
pub mod os_error;
pub mod platform_map;
pub mod sink;

pub use allowed::AllowedErrors;
pub use code::{ErrorDomain, SystemError};
pub use os_error::{OsError, Result};
pub use platform_map::posix_equivalent;
pub use sink::{check_code, check_status, ErrorCode, ErrorReport, ErrorSink, Throw};

/// Early-return through a sink when a fallible conversion fails.
///
/// Evaluates `$result` (a `Result<T, SystemError>`); on `Err` the error is
/// routed into `$sink` with `$fallback` as the returned value and the
/// remaining tokens as the lazily formatted message.
#[macro_export]
macro_rules! sink_try {
    ($sink:expr, $result:expr, $fallback:expr, $($fmt:tt)+) => {
        match $result {
            Ok(value) => value,
            Err(error) => {
                return $crate::ErrorSink::fail($sink, error, $fallback, || format!($($fmt)+));
            }
        }
    };
}
