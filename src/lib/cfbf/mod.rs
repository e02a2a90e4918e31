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

mod chain;
mod directory;
mod fat;
mod header;
mod stream;
mod structures;
#[cfg(test)]
mod testing;

pub use self::chain::{Chain, Link};
pub use self::directory::{filetime_to_system_time, Directory, DirectoryEntry, EntryType};
pub use self::fat::AllocationTable;
pub use self::stream::{Allocation, SectorStream, StreamReader};
pub use self::structures::*;

use crate::error::{Error, Result};
use crate::io::{source_len, SharedSource};
use std::io::{Read, Seek};
use std::sync::Mutex;

/// An opened compound file: header, allocation tables and directory, resolved once.
///
/// Streams are read through [`Container::open_stream`]; any number of them can be open at the
/// same time since they only borrow the container.
pub struct Container<R> {
	source: Mutex<R>,
	header: Header,
	sector_count: u32,
	fat: AllocationTable,
	mini_fat: AllocationTable,
	directory: Directory,
}

impl<R> Container<R> where R: Read + Seek {
	/// Parses the header, the FAT (including the DIFAT), the mini-FAT and the directory.
	/// Fails if any of them is invalid; nothing is returned for a partially readable container.
	pub fn open(mut source: R) -> Result<Container<R>> {
		let file_len = source_len(&mut source)?;
		if file_len < HEADER_SIZE as u64 {
			return Err(Error::InvalidFormat(format!("file is only {} bytes long", file_len)));
		}

		debug!("[open] Reading CFBF file header ({} bytes) ...", HEADER_SIZE);
		let mut buffer = [0; HEADER_SIZE];
		source.read_exact(&mut buffer)?;
		let header = Header::parse(&buffer)?;
		let sector_count = header.sector_count(file_len);
		debug!("[open] Version {}.{}, {} byte sectors, {} byte mini-sectors, mini stream cutoff {} bytes, {} sectors in file.",
			header.major_version, header.minor_version, header.sector_size, header.mini_sector_size, header.mini_stream_cutoff_size, sector_count);

		let source = Mutex::new(source);
		let mut shared = SharedSource::new(&source);
		let fat = AllocationTable::read_fat(&mut shared, &header, sector_count)?;
		let mini_fat = AllocationTable::read_mini_fat(&mut shared, &header, &fat, sector_count)?;

		// The directory stream has no declared length; it runs until its chain ends
		debug!("[open] Reading directory from sector #{} ...", header.first_directory_sector_location);
		let directory_len = fat.len() as u64 * header.sector_size;
		let directory_stream = SectorStream::new(shared, &fat, header.first_directory_sector_location, header.sector_size, header.data_offset(), directory_len);
		let directory = Directory::read(directory_stream, &header)?;
		debug!("[open] Directory holds {} entries.", directory.entries().len());

		Ok(Container { source, header, sector_count, fat, mini_fat, directory })
	}

	pub fn header(&self) -> &Header {
		&self.header
	}

	/// Number of sectors in the file, as computed from its length.
	pub fn sector_count(&self) -> u32 {
		self.sector_count
	}

	pub fn fat(&self) -> &AllocationTable {
		&self.fat
	}

	pub fn mini_fat(&self) -> &AllocationTable {
		&self.mini_fat
	}

	pub fn directory(&self) -> &Directory {
		&self.directory
	}

	pub fn entries(&self) -> &[DirectoryEntry] {
		self.directory.entries()
	}

	pub fn root(&self) -> &DirectoryEntry {
		self.directory.root()
	}

	/// Finds the first entry with the given name.
	pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
		self.directory.find(name)
	}

	/// Which allocation scheme holds the content of a stream entry of this container.
	pub fn allocation_of(&self, entry: &DirectoryEntry) -> Allocation {
		if entry.entry_type == EntryType::Stream && entry.stream_size < self.header.mini_stream_cutoff_size as u64 {
			Allocation::Mini
		}
		else {
			Allocation::Regular
		}
	}

	/// Opens the content of a stream entry (or the mini stream, for the root entry).
	pub fn open_stream(&self, entry: &DirectoryEntry) -> Result<StreamReader<'_, R>> {
		match entry.entry_type {
			EntryType::Stream | EntryType::RootStorage => {}
			_ => return Err(Error::NotAStream(entry.name.clone())),
		}
		debug!("[open_stream] Opening '{}' ({} bytes) at sector #{} ...", entry.name, entry.stream_size, entry.starting_sector_location);
		Ok(match self.allocation_of(entry) {
			Allocation::Regular => StreamReader::Regular(self.regular_stream(entry.starting_sector_location, entry.stream_size)),
			Allocation::Mini => {
				// Two levels: mini-FAT chain inside the mini stream, FAT chain for the mini stream itself
				let root = self.directory.root();
				let mini_stream = self.regular_stream(root.starting_sector_location, root.stream_size);
				StreamReader::Mini(SectorStream::new(mini_stream, &self.mini_fat, entry.starting_sector_location, self.header.mini_sector_size, 0, entry.stream_size))
			}
		})
	}

	/// Opens the first stream with the given name.
	pub fn open_by_name(&self, name: &str) -> Result<StreamReader<'_, R>> {
		let entry = self.find(name).ok_or_else(|| Error::NotFound(name.to_owned()))?;
		self.open_stream(entry)
	}

	/// Reads the whole content of a stream entry. Damaged chains yield the bytes that could be reached.
	pub fn read_stream(&self, entry: &DirectoryEntry) -> Result<Vec<u8>> {
		let mut stream = self.open_stream(entry)?;
		let mut data = Vec::with_capacity(stream.len().min(1 << 20) as usize);
		stream.read_to_end(&mut data)?;
		Ok(data)
	}

	/// Gives back the underlying source.
	pub fn into_inner(self) -> R {
		self.source.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn regular_stream(&self, start: u32, len: u64) -> SectorStream<'_, SharedSource<'_, R>> {
		SectorStream::new(SharedSource::new(&self.source), &self.fat, start, self.header.sector_size, self.header.data_offset(), len)
	}
}
