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

//! Aura proof-of-authority misbehavior monitor: wires the block codec,
//! block store, primary oracle, epoch fetcher, block fetcher and the three
//! fault reporters (`monitor-*` crates) into a single polling process.

pub mod app_state;
pub mod chain_spec;
pub mod cli;
pub mod error;
pub mod orchestrator;
pub mod reports;
