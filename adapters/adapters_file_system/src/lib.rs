//! Adapters Layer: File System
//!
//! Provides owning wrappers for file descriptors and memory mappings, pipes,
//! and the file operations that act on paths or descriptors.
//!
//! Every fallible operation takes an [`ErrorSink`](entities_system_errors::ErrorSink)
//! as its last argument. Passing [`Throw`](entities_system_errors::Throw) yields
//! a `Result`; passing `&mut ErrorCode` yields the plain value and records the
//! failure in the code.
//!
//! ## Modules
//!
//! - **[`descriptor`](descriptor/index.html)**: `FileDescriptor`, `FileDescriptorLike` and `Pipe`
//! - **[`memory_map`](memory_map/index.html)**: `MemoryMap`
//! - **[`file_ops`](file_ops/index.html)**: ownership, mode, status, directories, truncation, locking

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
pub mod descriptor;
#[cfg(unix)]
pub mod file_ops;
#[cfg(unix)]
pub mod memory_map;

#[cfg(unix)]
pub use descriptor::{FileDescriptor, FileDescriptorLike, Pipe};
#[cfg(unix)]
pub use file_ops::*;
#[cfg(unix)]
pub use memory_map::MemoryMap;
