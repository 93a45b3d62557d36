// Copyright 2026 The Aura Sentinel Authors.
// This file is part of aura-sentinel.

// aura-sentinel is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// aura-sentinel is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with aura-sentinel.  If not, see <http://www.gnu.org/licenses/>.

//! An adopted version of the default HTTP retry middleware: unlike a normal
//! bounded retry, this one retries transport failures forever with a fixed
//! delay between attempts. Semantic errors are never retried, they are
//! returned to the caller on the first attempt.

use std::thread;
use std::time::Duration;

use crate::error::RpcError;

pub const RETRY_DELAY: Duration = Duration::from_secs(5);

pub fn call_with_endless_retry<T>(
    mut attempt: impl FnMut() -> Result<T, RpcError>,
) -> Result<T, RpcError> {
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transport() => {
                log::warn!(
                    "RPC request failed with a transport error, retrying in {}s: {}",
                    RETRY_DELAY.as_secs(),
                    err
                );
                thread::sleep(RETRY_DELAY);
            }
            Err(err) => return Err(err),
        }
    }
}
