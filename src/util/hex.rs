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
use std::fmt::Write;

/// Render a byte slice as space-separated lower-case hex pairs, the
/// form used by the per-step log.
pub fn hex_bytes(bytes: &[u8]) -> String {
    let mut hexstr = String::with_capacity(3 * bytes.len());
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            hexstr.push(' ');
        }
        write!(hexstr, "{:02x}", b).unwrap();
    }
    hexstr
}
