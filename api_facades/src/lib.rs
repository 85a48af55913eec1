//! API Facades Layer
//!
//! Single entry point to the POSIX system-call bindings. Everything the inner
//! layers export is available from here, so callers depend on one crate.
//!
//! Socket options are kept under [`socket`] because several of their names
//! (`Debug`, `Linger`) would otherwise shadow common identifiers.
//!
//! ```no_run
//! use api_facades::nix::sys::wait::WaitPidFlag;
//! use api_facades::{libc, spawn, CStringArray, Pipe, SpawnFileActions, SpawnSettings, Throw};
//!
//! let mut pipe = Pipe::create(Throw)?;
//! let mut actions = SpawnFileActions::new()?;
//! actions.add_dup2(&pipe.write_end, libc::STDOUT_FILENO)?;
//!
//! let args = CStringArray::new(["sh", "-c", "echo hello"])?;
//! let settings = SpawnSettings::new().file_actions(&actions).use_path();
//! let mut child = spawn(&args, None, &settings, Throw)?;
//! pipe.write_end.close();
//!
//! let mut buf = [0u8; 16];
//! let read = pipe.read_end.read(&mut buf, Throw)?;
//! assert_eq!(&buf[..read], b"hello\n");
//! child.wait(WaitPidFlag::empty(), Throw)?;
//! # Ok::<(), api_facades::OsError>(())
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

pub use entities_system_errors::{
    check_code, check_status, posix_equivalent, sink_try, AllowedErrors, ErrorCode, ErrorDomain, ErrorReport, ErrorSink,
    OsError, Result, SystemError, Throw,
};

pub use entities_c_strings::{CPath, CStrLike, CStringArray};

#[cfg(unix)]
pub use adapters_file_system::*;

#[cfg(unix)]
pub use adapters_process_control::*;

#[cfg(unix)]
pub use usecases_process_spawning::*;

/// Sockets and their typed options
#[cfg(unix)]
pub mod socket {
    pub use adapters_socket::*;
}

#[cfg(unix)]
pub use adapters_socket::{
    bind_socket, create_socket, get_socket_name, get_socket_option, get_socket_option_raw, receive_socket,
    receive_socket_from, send_socket, set_socket_option, set_socket_option_raw, Socket, SocketLike, SocketOption,
};

pub use libc;
#[cfg(unix)]
pub use nix;
pub use socket2;
