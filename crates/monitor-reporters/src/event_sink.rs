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

//! A small callback abstraction shared by all three reporters, replacing
//! the source's ad hoc lists of callback closures with one trait.

pub trait EventSink<E> {
    fn on_event(&mut self, event: E);
}

impl<E, F: FnMut(E)> EventSink<E> for F {
    fn on_event(&mut self, event: E) {
        self(event)
    }
}
