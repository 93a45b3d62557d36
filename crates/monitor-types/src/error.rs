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

use thiserror::Error;

/// Errors raised while canonicalizing, hashing or recovering a block header.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("header fields have inconsistent lengths: {0}")]
    MalformedHeader(String),

    #[error("bare hash requires exactly two seal fields, found {0}")]
    UnsupportedSeal(usize),

    #[error("could not recover signer from signature: {0}")]
    BadSignature(String),

    #[error("step value does not fit in a u64")]
    StepOverflow,
}
