/*
oleread library & toolset
Copyright (C) 2018 Steve Muller <steve.muller@outlook.com>

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

use super::structures::{is_regular_sector, ENDOFCHAIN};

/// Outcome of following one link of a sector chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
	Next(u32),
	End,
	/// The chain leaves the table, hits a reserved marker, or runs longer than the table (a cycle).
	Broken,
}

/// Cursor over a chain of sector (or mini-sector) ids in an allocation table.
///
/// No chain can visit more sectors than the table has entries, so the number of links
/// followed is capped at the table length; exceeding it means the chain loops.
#[derive(Clone, Debug)]
pub struct Chain<'a> {
	table: &'a [u32],
	current: u32,
	steps: usize,
}

impl<'a> Chain<'a> {
	pub fn new(table: &'a [u32], start: u32) -> Chain<'a> {
		Chain { table, current: start, steps: 0 }
	}

	/// The sector the cursor is on. `ENDOFCHAIN` for an empty chain.
	pub fn current(&self) -> u32 {
		self.current
	}

	/// Number of links followed since the start of the chain, i.e. the position of
	/// `current()` within the chain.
	pub fn steps(&self) -> usize {
		self.steps
	}

	/// Whether the cursor sits on a sector that the table covers.
	pub fn is_valid(&self) -> bool {
		self.covers(self.current)
	}

	fn covers(&self, sector: u32) -> bool {
		is_regular_sector(sector) && (sector as usize) < self.table.len()
	}

	/// Moves to the next sector of the chain.
	pub fn advance(&mut self) -> Link {
		if self.current == ENDOFCHAIN {
			return Link::End;
		}
		if self.steps >= self.table.len() {
			trace!("[chain] Sector #{} exceeds the step budget of {}, assuming a cycle", self.current, self.table.len());
			return Link::Broken;
		}
		let next = match self.table.get(self.current as usize) {
			Some(&next) => next,
			None => {
				trace!("[chain] Sector #{} is outside the table ({} entries)", self.current, self.table.len());
				return Link::Broken;
			}
		};
		match next {
			ENDOFCHAIN => Link::End,
			next if self.covers(next) => {
				self.current = next;
				self.steps += 1;
				Link::Next(next)
			}
			other => {
				trace!("[chain] Sector #{} links to {:#X}, which is not a sector of this table", self.current, other);
				Link::Broken
			}
		}
	}

	/// Follows a whole chain. Returns the sectors visited and how the walk ended
	/// (`Link::End` for an intact chain, `Link::Broken` otherwise).
	pub fn walk(table: &'a [u32], start: u32) -> (Vec<u32>, Link) {
		let mut chain = Chain::new(table, start);
		if start == ENDOFCHAIN {
			return (Vec::new(), Link::End);
		}
		if !chain.is_valid() {
			return (Vec::new(), Link::Broken);
		}
		let mut sectors = vec![start];
		loop {
			match chain.advance() {
				Link::Next(sector) => sectors.push(sector),
				end => return (sectors, end),
			}
		}
	}
}
