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

use super::chain::{Chain, Link};
use super::structures::*;
use crate::error::{Error, Result};
use crate::io::ReadAt;

/// A sector allocation table: entry `n` holds the sector that follows sector `n` in its chain.
///
/// The same shape serves the FAT (regular sectors) and the mini-FAT (mini-sectors of the
/// mini stream).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocationTable {
	entries: Vec<u32>,
}

impl AllocationTable {
	pub fn from_entries(entries: Vec<u32>) -> AllocationTable {
		AllocationTable { entries }
	}

	pub fn entries(&self) -> &[u32] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, sector: u32) -> Option<u32> {
		self.entries.get(sector as usize).copied()
	}

	/// A cursor over the chain that starts at `start`.
	pub fn chain(&self, start: u32) -> Chain<'_> {
		Chain::new(&self.entries, start)
	}

	/// Resolves the complete FAT: first the FAT sectors listed in the header, then those listed in the
	/// DIFAT chain.
	///
	/// `sector_count` is the number of sectors the source holds; FAT and DIFAT locations beyond it
	/// are corruption.
	pub fn read_fat<S: ReadAt>(source: &mut S, header: &Header, sector_count: u32) -> Result<AllocationTable> {
		let fat_sectors = header.number_of_fat_sectors as usize;
		if fat_sectors > sector_count as usize {
			return Err(Error::Corrupt(format!("header declares {} FAT sectors but the file only has {} sectors", fat_sectors, sector_count)));
		}
		debug!("[read_fat] Reading {} FAT sectors ...", fat_sectors);

		let mut table = AllocationTable { entries: Vec::with_capacity(fat_sectors * header.ids_per_sector()) };
		let mut located = 0;

		// The first 109 FAT sector locations are listed right after the header
		for &fat_sector in header.difat.iter().take(fat_sectors) {
			table.append_sector(source, header, fat_sector, sector_count, "FAT")?;
			located += 1;
		}

		// All subsequent ones are listed in the DIFAT sectors, whose last slot links to the next DIFAT sector
		if located < fat_sectors {
			let mut difat_sector = header.first_difat_sector_location;
			let mut difat_sectors_visited = 0u32;
			while located < fat_sectors && difat_sector != ENDOFCHAIN {
				if difat_sectors_visited >= sector_count {
					return Err(Error::Corrupt(format!("DIFAT chain loops (at sector #{})", difat_sector)));
				}
				trace!("[read_fat] Reading DIFAT sector #{} ...", difat_sector);
				let buffer = read_sector(source, header, difat_sector, sector_count, "DIFAT")?;
				let ids: Vec<u32> = sector_ids(&buffer).collect();
				let (fat_locations, next) = ids.split_at(ids.len() - 1);
				for &fat_sector in fat_locations {
					if located >= fat_sectors {
						break;
					}
					table.append_sector(source, header, fat_sector, sector_count, "FAT")?;
					located += 1;
				}
				difat_sector = next[0];
				difat_sectors_visited += 1;
			}
			if located < fat_sectors {
				warn!("[read_fat] DIFAT chain ended after {} of {} FAT sectors", located, fat_sectors);
			}
		}

		debug!("[read_fat] FAT has {} entries.", table.len());
		Ok(table)
	}

	/// Resolves the mini-FAT, whose sectors form a regular chain in the FAT.
	pub fn read_mini_fat<S: ReadAt>(source: &mut S, header: &Header, fat: &AllocationTable, sector_count: u32) -> Result<AllocationTable> {
		let start = header.first_mini_fat_sector_location;
		let mini_fat_sectors = header.number_of_mini_fat_sectors as usize;
		if start == ENDOFCHAIN || mini_fat_sectors == 0 {
			debug!("[read_mini_fat] No mini-FAT.");
			return Ok(AllocationTable::default());
		}
		if mini_fat_sectors > sector_count as usize {
			return Err(Error::Corrupt(format!("header declares {} mini-FAT sectors but the file only has {} sectors", mini_fat_sectors, sector_count)));
		}

		let (sectors, end) = Chain::walk(fat.entries(), start);
		if sectors.len() < mini_fat_sectors {
			if end == Link::Broken {
				return Err(Error::Corrupt(format!("mini-FAT chain from sector #{} is broken after {} sectors", start, sectors.len())));
			}
			warn!("[read_mini_fat] Mini-FAT chain holds {} of {} declared sectors", sectors.len(), mini_fat_sectors);
		}

		let mini_fat_sectors = sectors.len().min(mini_fat_sectors);
		debug!("[read_mini_fat] Reading {} mini-FAT sectors ...", mini_fat_sectors);
		let mut table = AllocationTable { entries: Vec::with_capacity(mini_fat_sectors * header.ids_per_sector()) };
		for &sector in sectors.iter().take(mini_fat_sectors) {
			table.append_sector(source, header, sector, sector_count, "mini-FAT")?;
		}
		debug!("[read_mini_fat] Mini-FAT has {} entries.", table.len());
		Ok(table)
	}

	fn append_sector<S: ReadAt>(&mut self, source: &mut S, header: &Header, sector: u32, sector_count: u32, kind: &str) -> Result<()> {
		trace!("[append_sector] Reading {} sector #{} ...", kind, sector);
		let buffer = read_sector(source, header, sector, sector_count, kind)?;
		self.entries.extend(sector_ids(&buffer));
		Ok(())
	}
}

fn read_sector<S: ReadAt>(source: &mut S, header: &Header, sector: u32, sector_count: u32, kind: &str) -> Result<Vec<u8>> {
	if !is_regular_sector(sector) || sector >= sector_count {
		return Err(Error::Corrupt(format!("{} sector location {:#X} is outside the file ({} sectors)", kind, sector, sector_count)));
	}
	let mut buffer = vec![0; header.sector_size as usize];
	source.read_exact_at(header.sector_position(sector), &mut buffer)?;
	Ok(buffer)
}
