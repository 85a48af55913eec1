//! Use Cases Layer: Process Spawning
//!
//! Provides the ways of starting a program in a child process:
//! - `fork_process`, followed by one of the `exec*` calls in the child
//! - `spawn`/`spawn_program` over `posix_spawn(3)`, configured with
//!   `SpawnFileActions` and `SpawnAttr` through `SpawnSettings`
//!
//! Arguments and environments are `CStringArray`s. When no environment is
//! given the child receives a copy of the caller's.
//!
//! Depends on the process-control adapter for `ChildProcess` and `SignalSet`,
//! and on the file-system adapter for descriptor arguments.

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
pub mod exec;
#[cfg(unix)]
pub mod spawn;

#[cfg(unix)]
pub use exec::{exec, exec_program, exec_search, exec_search_program, fork_process};
#[cfg(unix)]
pub use spawn::{spawn, spawn_program, SpawnAttr, SpawnFileActions, SpawnSettings};
