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

//! Canonicalization, hashing, signer recovery and step decoding for Aura
//! block headers (C1 of the misbehavior monitor).

mod codec;
mod error;
mod header;
pub mod hexbytes;
mod raw;

pub use codec::{bare_hash, canonicalize, decode_step, recover_proposer};
pub use error::CodecError;
pub use header::Header;
pub use raw::RawBlock;
