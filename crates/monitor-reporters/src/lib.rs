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

//! Fault detectors that consume accepted blocks (C6, C7, C8).

mod equivocation;
mod event_sink;
mod offline;
mod skip;

pub use equivocation::EquivocationReporter;
pub use event_sink::EventSink;
pub use offline::{invariant_holds, OfflineInterval, OfflineReporter, OfflineReporterState};
pub use skip::{SkipReporter, SkipReporterState, SkippedProposal};
