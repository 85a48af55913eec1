//! Entities Layer: C Strings
//!
//! Provides the adaptation of Rust strings and paths into the NUL-terminated
//! form system calls expect, and the builder for `argv`/`envp` style pointer
//! arrays.
//!
//! ## Modules
//!
//! - **[`c_path`](c_path/index.html)**: `CPath` and `CStrLike` conversions
//! - **[`string_array`](string_array/index.html)**: `CStringArray`, a null-terminated array of C strings

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

pub mod c_path;
pub mod string_array;

pub use c_path::{CPath, CStrLike};
pub use string_array::CStringArray;
