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

// Also see: [MS-CFB]: Compound File Binary File Format specifications, https://msdn.microsoft.com/en-us/library/dd942138.aspx

/// `D0 CF 11 E0 A1 B1 1A E1`, read as a little-endian u64.
pub const HEADER_SIGNATURE: u64 = 0xE11A_B1A1_E011_CFD0;
pub const BYTE_ORDER_MARK: u16 = 0xFFFE;
pub const HEADER_SIZE: usize = 512;
pub const DIRECTORY_ENTRY_SIZE: usize = 128;
/// Number of FAT sector locations stored in the header itself.
pub const HEADER_DIFAT_ENTRIES: usize = 109;

/// Largest sector number that refers to an actual sector.
pub const MAXREGSECT: u32 = 0xFFFF_FFFA;
pub const DIFSECT: u32 = 0xFFFF_FFFC;
pub const FATSECT: u32 = 0xFFFF_FFFD;
pub const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
pub const FREESECT: u32 = 0xFFFF_FFFF;
/// Absent sibling/child reference in a directory entry.
pub const NOSTREAM: u32 = 0xFFFF_FFFF;

/// Whether `sector` is an ordinary sector number rather than one of the reserved markers.
pub fn is_regular_sector(sector: u32) -> bool {
	sector <= MAXREGSECT
}

/// The header of a CFBF file, including the 109 inline DIFAT entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
	pub signature: u64,
	pub clsid: [u8; 16],
	pub minor_version: u16,
	pub major_version: u16,
	pub byte_order: u16,
	pub sector_shift: u16,
	pub sector_size: u64, // virtual field; not actually contained in CFBF file
	pub mini_sector_shift: u16,
	pub mini_sector_size: u64, // virtual field; not actually contained in CFBF file
	pub reserved: [u8; 6],
	pub number_of_directory_sectors: u32,
	pub number_of_fat_sectors: u32,
	pub first_directory_sector_location: u32,
	pub transaction_signature: u32,
	/// Streams strictly smaller than this live in the mini stream.
	pub mini_stream_cutoff_size: u32,
	pub first_mini_fat_sector_location: u32,
	pub number_of_mini_fat_sectors: u32,
	pub first_difat_sector_location: u32,
	pub number_of_difat_sectors: u32,
	/// Locations of the first 109 FAT sectors.
	pub difat: [u32; HEADER_DIFAT_ENTRIES],
}

impl Header {
	/// Number of sector ids that fit in one (regular) sector.
	pub fn ids_per_sector(&self) -> usize {
		(self.sector_size / 4) as usize
	}

	/// Byte position of sector 0. The header fills the first sector slot.
	pub fn data_offset(&self) -> u64 {
		self.sector_size
	}

	/// Byte position of a regular sector in the file.
	pub fn sector_position(&self, sector: u32) -> u64 {
		(sector as u64 + 1) * self.sector_size
	}

	/// Number of (possibly partial) sectors in a file of `file_len` bytes.
	pub fn sector_count(&self, file_len: u64) -> u32 {
		let sectors = file_len.saturating_sub(self.data_offset()).div_ceil(self.sector_size);
		sectors.min(MAXREGSECT as u64 + 1) as u32
	}
}

pub(crate) fn le_u16(buffer: &[u8], offset: usize) -> u16 {
	u16::from_le_bytes([buffer[offset], buffer[offset + 1]])
}

pub(crate) fn le_u32(buffer: &[u8], offset: usize) -> u32 {
	u32::from_le_bytes([buffer[offset], buffer[offset + 1], buffer[offset + 2], buffer[offset + 3]])
}

pub(crate) fn le_u64(buffer: &[u8], offset: usize) -> u64 {
	let mut bytes = [0u8; 8];
	bytes.copy_from_slice(&buffer[offset..offset + 8]);
	u64::from_le_bytes(bytes)
}

/// Decodes a buffer of little-endian sector ids, as stored in FAT, mini-FAT and DIFAT sectors.
pub(crate) fn sector_ids(buffer: &[u8]) -> impl Iterator<Item = u32> + '_ {
	buffer.chunks_exact(4).map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}
