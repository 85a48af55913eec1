//! Adapters Layer: Sockets
//!
//! Provides socket creation, raw and typed socket options, and the
//! bind/name/send/receive calls. On Unix a socket is an ordinary
//! [`FileDescriptor`](adapters_file_system::FileDescriptor), so everything
//! that accepts a descriptor also accepts a socket.
//!
//! Addresses are `socket2::SockAddr` values; message flags are nix's
//! `MsgFlags`.
//!
//! ## Modules
//!
//! - **[`socket`](socket/index.html)**: `create_socket`, raw options, bind, send, receive
//! - **[`options`](options/index.html)**: the `SocketOption` trait and the standard options

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

#[cfg(unix)]
pub mod options;
#[cfg(unix)]
pub mod socket;

#[cfg(unix)]
pub use options::*;
#[cfg(unix)]
pub use socket::*;
