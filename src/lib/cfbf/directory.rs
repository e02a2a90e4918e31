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

use super::structures::*;
use crate::error::{Error, Result};
use std::char::{decode_utf16, REPLACEMENT_CHARACTER};
use std::collections::HashSet;
use std::io::{ErrorKind, Read};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between 1601-01-01 (the FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_OFFSET: u64 = 11_644_473_600;

/// A storage or stream described by one 128-byte record of the directory stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
	/// Index of the record within the directory stream; sibling and child references use it.
	pub id: u32,
	pub name: String,
	pub entry_type: EntryType,
	/// Red-black tree node colour (0 = red, 1 = black). Not validated.
	pub color: u8,
	/// The ID of the left sibling object in the binary tree (in this folder).
	pub left_sibling_id: u32,
	/// The ID of the right sibling object in the binary tree (in this folder).
	pub right_sibling_id: u32,
	/// If this object is a folder: the ID of the first child of this folder. Otherwise undefined.
	pub child_id: u32,
	pub clsid: [u8; 16],
	pub state_bits: u32,
	pub creation_time: u64,
	pub modified_time: u64,
	/// If this object is a file: the location of the first sector (or mini-sector) that holds the file content.
	/// For the root storage: the first sector of the mini stream.
	pub starting_sector_location: u32,
	/// If this object is a file: the length of the file content. For the root storage: the length of the mini stream.
	pub stream_size: u64,
	/// High half of the size field. Only meaningful as a size in version 4 files.
	pub property_type: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryType {
	Unused,
	/// A folder.
	Storage,
	/// A file.
	Stream,
	LockBytes,
	Property,
	/// The root folder.
	RootStorage,
	Unknown(u8),
}

impl From<u8> for EntryType {
	fn from(value: u8) -> EntryType {
		match value {
			0 => EntryType::Unused,
			1 => EntryType::Storage,
			2 => EntryType::Stream,
			3 => EntryType::LockBytes,
			4 => EntryType::Property,
			5 => EntryType::RootStorage,
			other => EntryType::Unknown(other),
		}
	}
}

impl DirectoryEntry {
	/// Decodes one directory record. Returns `None` for unused slots: an unused or unknown type, or a
	/// name length that leaves no characters.
	pub fn parse(id: u32, buffer: &[u8], major_version: u16) -> Option<DirectoryEntry> {
		let entry_type = EntryType::from(buffer[66]);
		if matches!(entry_type, EntryType::Unused | EntryType::Unknown(_)) {
			return None;
		}
		// The length is expressed in bytes and includes the trailing NUL
		let name_length = le_u16(buffer, 64) as usize;
		if name_length < 4 {
			return None;
		}
		let name_units: Vec<u16> = (0..(name_length / 2 - 1).min(32))
			.map(|i| le_u16(buffer, i * 2))
			.take_while(|&unit| unit != 0)
			.collect();
		let name = decode_utf16(name_units)
			.map(|r| r.unwrap_or(REPLACEMENT_CHARACTER))
			.collect::<String>();

		let mut clsid = [0u8; 16];
		clsid.copy_from_slice(&buffer[80..96]);
		let size_low = le_u32(buffer, 120);
		let size_high = le_u32(buffer, 124);
		// Version 3 writers may leave garbage in the high half
		let stream_size = if major_version >= 4 {
			(size_high as u64) << 32 | size_low as u64
		}
		else {
			size_low as u64
		};

		Some(DirectoryEntry {
			id,
			name,
			entry_type,
			color: buffer[67],
			left_sibling_id: le_u32(buffer, 68),
			right_sibling_id: le_u32(buffer, 72),
			child_id: le_u32(buffer, 76),
			clsid,
			state_bits: le_u32(buffer, 96),
			creation_time: le_u64(buffer, 100),
			modified_time: le_u64(buffer, 108),
			starting_sector_location: le_u32(buffer, 116),
			stream_size,
			property_type: size_high,
		})
	}

	pub fn is_stream(&self) -> bool {
		self.entry_type == EntryType::Stream
	}

	pub fn is_storage(&self) -> bool {
		matches!(self.entry_type, EntryType::Storage | EntryType::RootStorage)
	}

	pub fn created(&self) -> Option<SystemTime> {
		filetime_to_system_time(self.creation_time)
	}

	pub fn modified(&self) -> Option<SystemTime> {
		filetime_to_system_time(self.modified_time)
	}
}

/// Converts a FILETIME (100 ns ticks since 1601-01-01) to a `SystemTime`. Zero means "not set".
pub fn filetime_to_system_time(filetime: u64) -> Option<SystemTime> {
	if filetime == 0 {
		return None;
	}
	let since_1601 = Duration::new(filetime / 10_000_000, (filetime % 10_000_000) as u32 * 100);
	let offset = Duration::from_secs(FILETIME_UNIX_OFFSET);
	if since_1601 >= offset {
		UNIX_EPOCH.checked_add(since_1601 - offset)
	}
	else {
		UNIX_EPOCH.checked_sub(offset - since_1601)
	}
}

/// The flat list of used directory entries, in on-disk order.
#[derive(Clone, Debug)]
pub struct Directory {
	entries: Vec<DirectoryEntry>,
	root: usize,
}

impl Directory {
	/// Reads 128-byte records from the directory stream until it ends.
	pub fn read<R: Read>(mut stream: R, header: &Header) -> Result<Directory> {
		let mut entries = Vec::new();
		let mut buffer = [0u8; DIRECTORY_ENTRY_SIZE];
		let mut id = 0u32;
		loop {
			let have_read = read_record(&mut stream, &mut buffer)?;
			if have_read < DIRECTORY_ENTRY_SIZE {
				if have_read > 0 {
					warn!("[read_directory] Directory stream ends inside record #{}", id);
				}
				break;
			}
			match DirectoryEntry::parse(id, &buffer, header.major_version) {
				Some(entry) => {
					trace!("[read_directory] Record #{}: {:?} '{}' ({} bytes)", id, entry.entry_type, entry.name, entry.stream_size);
					entries.push(entry);
				}
				None => trace!("[read_directory] Record #{} is unused", id),
			}
			id = match id.checked_add(1) {
				Some(next) => next,
				None => break,
			};
		}
		debug!("[read_directory] {} records, {} in use.", id, entries.len());
		Directory::from_entries(entries)
	}

	/// Builds a directory from already decoded entries. Exactly one root storage is expected; if there
	/// are several, the first one wins.
	pub fn from_entries(entries: Vec<DirectoryEntry>) -> Result<Directory> {
		let mut roots = entries.iter().enumerate().filter(|(_, entry)| entry.entry_type == EntryType::RootStorage);
		let root = match roots.next() {
			Some((index, _)) => index,
			None => return Err(Error::Corrupt("directory has no root entry".to_owned())),
		};
		if roots.next().is_some() {
			warn!("[read_directory] Directory has more than one root entry, using record #{}", entries[root].id);
		}
		Ok(Directory { entries, root })
	}

	pub fn entries(&self) -> &[DirectoryEntry] {
		&self.entries
	}

	pub fn root(&self) -> &DirectoryEntry {
		&self.entries[self.root]
	}

	/// Looks up an entry by its record index.
	pub fn get(&self, id: u32) -> Option<&DirectoryEntry> {
		self.entries
			.binary_search_by_key(&id, |entry| entry.id)
			.ok()
			.map(|index| &self.entries[index])
	}

	/// Finds the first entry with the given name.
	pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
		self.entries.iter().find(|entry| entry.name == name)
	}

	/// Finds the first entry whose name is one of `names`, trying the names in order.
	/// Useful for formats whose main stream went by different names over time (`Workbook` / `Book`).
	pub fn find_any(&self, names: &[&str]) -> Option<&DirectoryEntry> {
		names.iter().find_map(|name| self.find(name))
	}

	/// The path of every entry reachable from the root through child and sibling references,
	/// e.g. `/Storage1/Stream1`. The root itself has the empty path.
	///
	/// References to missing records are skipped and every record is visited at most once, so
	/// damaged trees still terminate.
	pub fn paths(&self) -> Vec<(&DirectoryEntry, String)> {
		let mut paths = Vec::new();
		let mut visited = HashSet::new();
		let root = self.root();
		visited.insert(root.id);
		paths.push((root, String::new()));

		let mut pending = vec![(root.child_id, String::new())];
		while let Some((id, prefix)) = pending.pop() {
			if id == NOSTREAM || !visited.insert(id) {
				continue;
			}
			let entry = match self.get(id) {
				Some(entry) => entry,
				None => continue,
			};
			let path = format!("{}/{}", prefix, entry.name);
			// Visit order: left subtree, right subtree, then children
			pending.push((entry.child_id, path.clone()));
			pending.push((entry.right_sibling_id, prefix.clone()));
			pending.push((entry.left_sibling_id, prefix));
			paths.push((entry, path));
		}
		paths
	}
}

fn read_record<R: Read>(stream: &mut R, buffer: &mut [u8]) -> Result<usize> {
	let mut have_read = 0;
	while have_read < buffer.len() {
		match stream.read(&mut buffer[have_read..]) {
			Ok(0) => break,
			Ok(n) => have_read += n,
			Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
			Err(e) => return Err(e.into()),
		}
	}
	Ok(have_read)
}
