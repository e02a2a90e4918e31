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
use super::fat::AllocationTable;
use super::structures::ENDOFCHAIN;
use crate::io::{ReadAt, SharedSource};
use std::cmp::min;
use std::io::{Error, ErrorKind, Read, Seek, SeekFrom};

/// Which allocation scheme serves a stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Allocation {
	/// Regular sectors, chained through the FAT.
	Regular,
	/// Mini-sectors inside the root's mini stream, chained through the mini-FAT.
	Mini,
}

/// A chain of fixed-size sectors presented as one contiguous, seekable byte range.
///
/// Sector `n` of the chain lives at `base + n * sector_size` in the backing reader. Regular
/// streams are backed by the container's source; mini streams are backed by another
/// `SectorStream` over the mini stream.
///
/// Reads stop at the declared length, at the end of the chain, or where the chain turns out to
/// be damaged. The last two shorten the stream rather than fail it.
pub struct SectorStream<'a, B> {
	backing: B,
	table: &'a AllocationTable,
	start: u32,
	sector_size: u64,
	base: u64,
	len: u64,
	pos: u64,
	chain: Chain<'a>,
	/// Bytes from here on cannot be reached through the chain.
	reachable: u64,
}

impl<'a, B> SectorStream<'a, B> where B: ReadAt {
	pub fn new(backing: B, table: &'a AllocationTable, start: u32, sector_size: u64, base: u64, len: u64) -> SectorStream<'a, B> {
		let chain = table.chain(start);
		let reachable = if chain.is_valid() {
			len
		}
		else {
			if start != ENDOFCHAIN && len > 0 {
				warn!("[stream] Stream of {} bytes starts at invalid sector {:#X}", len, start);
			}
			0
		};
		SectorStream { backing, table, start, sector_size, base, len, pos: 0, chain, reachable }
	}

	/// The declared length of the stream.
	pub fn len(&self) -> u64 {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn position(&self) -> u64 {
		self.pos
	}

	/// Moves the chain cursor onto the sector that holds byte `self.pos`.
	/// Returns `None` (and shortens the stream) if the chain does not reach that far.
	fn locate(&mut self) -> Option<u32> {
		let index = (self.pos / self.sector_size) as usize;
		if index < self.chain.steps() {
			trace!("[stream] Rewinding chain from sector #{}", self.start);
			self.chain = self.table.chain(self.start);
		}
		while self.chain.steps() < index {
			match self.chain.advance() {
				Link::Next(sector) => trace!("[stream] Next sector: #{}", sector),
				end => {
					let reachable = (self.chain.steps() as u64 + 1) * self.sector_size;
					if end == Link::Broken {
						warn!("[stream] Sector chain from #{} is damaged after {} bytes; truncating stream of {} bytes", self.start, reachable, self.len);
					}
					else {
						debug!("[stream] Sector chain from #{} ends after {} bytes", self.start, reachable);
					}
					self.reachable = min(self.reachable, reachable);
					return None;
				}
			}
		}
		Some(self.chain.current())
	}
}

impl<'a, B> Read for SectorStream<'a, B> where B: ReadAt {
	fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
		let mut have_read = 0;
		while have_read < buf.len() {
			let end = min(self.len, self.reachable);
			if self.pos >= end {
				break;
			}
			let sector = match self.locate() {
				Some(sector) => sector,
				None => break,
			};

			// Don't read more bytes than there are in this sector
			let offset_in_sector = self.pos % self.sector_size;
			let want_read = min((buf.len() - have_read) as u64, min(self.sector_size - offset_in_sector, end - self.pos)) as usize;
			let position = self.base + sector as u64 * self.sector_size + offset_in_sector;
			let n = self.backing.read_at(position, &mut buf[have_read..have_read + want_read])?;
			if n == 0 {
				warn!("[stream] Data ends inside sector #{}; truncating stream at {} bytes", sector, self.pos);
				self.reachable = self.pos;
				break;
			}
			self.pos += n as u64;
			have_read += n;
		}
		Ok(have_read)
	}
}

impl<'a, B> Seek for SectorStream<'a, B> where B: ReadAt {
	fn seek(&mut self, pos: SeekFrom) -> Result<u64, Error> {
		let target = match pos {
			SeekFrom::Start(offset) => Some(offset),
			SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
			SeekFrom::End(delta) => self.len.checked_add_signed(delta),
		};
		match target {
			Some(target) => {
				// The chain itself is walked lazily by the next read
				self.pos = target;
				Ok(target)
			}
			None => Err(Error::new(ErrorKind::InvalidInput, "Invalid seek to a negative or overflowing position")),
		}
	}
}

/// A sector stream is itself a positioned source, which is how mini streams read the mini stream.
impl<'a, B> ReadAt for SectorStream<'a, B> where B: ReadAt {
	fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize, Error> {
		self.pos = pos;
		self.read(buf)
	}
}

/// Reader for the content of one directory entry.
pub enum StreamReader<'a, R> {
	Regular(SectorStream<'a, SharedSource<'a, R>>),
	Mini(SectorStream<'a, SectorStream<'a, SharedSource<'a, R>>>),
}

impl<'a, R> StreamReader<'a, R> where R: Read + Seek {
	pub fn allocation(&self) -> Allocation {
		match self {
			StreamReader::Regular(_) => Allocation::Regular,
			StreamReader::Mini(_) => Allocation::Mini,
		}
	}

	/// The declared length of the stream.
	pub fn len(&self) -> u64 {
		match self {
			StreamReader::Regular(stream) => stream.len(),
			StreamReader::Mini(stream) => stream.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn position(&self) -> u64 {
		match self {
			StreamReader::Regular(stream) => stream.position(),
			StreamReader::Mini(stream) => stream.position(),
		}
	}
}

impl<'a, R> Read for StreamReader<'a, R> where R: Read + Seek {
	fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
		match self {
			StreamReader::Regular(stream) => stream.read(buf),
			StreamReader::Mini(stream) => stream.read(buf),
		}
	}
}

impl<'a, R> Seek for StreamReader<'a, R> where R: Read + Seek {
	fn seek(&mut self, pos: SeekFrom) -> Result<u64, Error> {
		match self {
			StreamReader::Regular(stream) => stream.seek(pos),
			StreamReader::Mini(stream) => stream.seek(pos),
		}
	}
}
