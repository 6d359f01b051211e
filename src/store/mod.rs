// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
mod fasthash;
mod table;

pub use fasthash::*;
pub use table::*;

use std::fmt;

/// Default number of buckets in an instruction store (2^16).
pub const DEFAULT_STORE_SIZE: usize = 65536;

// ============================================================================
// Errors
// ============================================================================

/// Errors which can arise when constructing an instruction store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// A store was requested with zero buckets.
    ZeroCapacity,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::ZeroCapacity => {
                write!(f, "instruction store requires at least one bucket")
            }
        }
    }
}

impl std::error::Error for StoreError {}
