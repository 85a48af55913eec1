//! Adapters Layer: Process Control
//!
//! Provides the child-process wrapper and its wait protocol, signal sets,
//! handlers, actions and masks, process identity and supplementary groups,
//! the user and group database, and system configuration queries.
//!
//! ## Modules
//!
//! - **[`child_process`](child_process/index.html)**: `ChildProcess`, `ProcessStatus`, `ProcessLike`
//! - **[`signals`](signals/index.html)**: `SignalSet`, `SignalAction`, sending and handling signals
//! - **[`identity`](identity/index.html)**: real/effective ids and group lists
//! - **[`users`](users/index.html)**: `Passwd` and `Group` lookups
//! - **[`system`](system/index.html)**: `sysconf` and host name

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
pub mod child_process;
#[cfg(unix)]
pub mod identity;
#[cfg(unix)]
pub mod signals;
#[cfg(unix)]
pub mod system;
#[cfg(unix)]
pub mod users;

#[cfg(unix)]
pub use child_process::{ChildProcess, ProcessLike, ProcessStatus};
#[cfg(unix)]
pub use identity::{get_groups, set_groups, Identity};
#[cfg(unix)]
pub use signals::*;
#[cfg(unix)]
pub use system::{get_host_name, host_name, system_config};
#[cfg(unix)]
pub use users::{Group, Passwd};
