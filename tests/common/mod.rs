#![allow(dead_code)]

use oleread::cfbf::{Header, BYTE_ORDER_MARK, ENDOFCHAIN, FATSECT, FREESECT, HEADER_DIFAT_ENTRIES, HEADER_SIGNATURE, NOSTREAM};

pub const SECTOR: usize = 512;

/// A version 3 header with one FAT sector at sector 0 and the directory at sector 1.
pub fn header() -> Header {
	let mut difat = [FREESECT; HEADER_DIFAT_ENTRIES];
	difat[0] = 0;
	Header {
		signature: HEADER_SIGNATURE,
		clsid: [0; 16],
		minor_version: 0x3E,
		major_version: 3,
		byte_order: BYTE_ORDER_MARK,
		sector_shift: 9,
		sector_size: 512,
		mini_sector_shift: 6,
		mini_sector_size: 64,
		reserved: [0; 6],
		number_of_directory_sectors: 0,
		number_of_fat_sectors: 1,
		first_directory_sector_location: 1,
		transaction_signature: 0,
		mini_stream_cutoff_size: 4096,
		first_mini_fat_sector_location: ENDOFCHAIN,
		number_of_mini_fat_sectors: 0,
		first_difat_sector_location: ENDOFCHAIN,
		number_of_difat_sectors: 0,
		difat,
	}
}

/// One sector of sector ids, padded with `FREESECT`.
pub fn ids(values: &[u32]) -> Vec<u8> {
	let mut sector = Vec::with_capacity(SECTOR);
	for value in values.iter().chain(std::iter::repeat(&FREESECT)).take(SECTOR / 4) {
		sector.extend_from_slice(&value.to_le_bytes());
	}
	sector
}

/// One sector of recognisable bytes; different seeds give different content.
pub fn pattern(seed: usize) -> Vec<u8> {
	(0..SECTOR).map(|i| ((i * 31 + seed * 17 + 1) % 251) as u8).collect()
}

pub struct Entry<'a> {
	pub name: &'a str,
	pub entry_type: u8,
	pub left: u32,
	pub right: u32,
	pub child: u32,
	pub start: u32,
	pub size: u32,
}

impl<'a> Entry<'a> {
	pub fn root(child: u32, start: u32, size: u32) -> Entry<'a> {
		Entry { name: "Root Entry", entry_type: 5, left: NOSTREAM, right: NOSTREAM, child, start, size }
	}

	pub fn stream(name: &'a str, start: u32, size: u32) -> Entry<'a> {
		Entry { name, entry_type: 2, left: NOSTREAM, right: NOSTREAM, child: NOSTREAM, start, size }
	}

	pub fn storage(name: &'a str, child: u32) -> Entry<'a> {
		Entry { name, entry_type: 1, left: NOSTREAM, right: NOSTREAM, child, start: 0, size: 0 }
	}

	pub fn siblings(mut self, left: u32, right: u32) -> Entry<'a> {
		self.left = left;
		self.right = right;
		self
	}

	pub fn encode(&self) -> Vec<u8> {
		let mut record = vec![0u8; 128];
		let units: Vec<u16> = self.name.encode_utf16().collect();
		for (i, unit) in units.iter().enumerate() {
			record[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
		}
		record[64..66].copy_from_slice(&((units.len() as u16 + 1) * 2).to_le_bytes());
		record[66] = self.entry_type;
		record[67] = 1;
		record[68..72].copy_from_slice(&self.left.to_le_bytes());
		record[72..76].copy_from_slice(&self.right.to_le_bytes());
		record[76..80].copy_from_slice(&self.child.to_le_bytes());
		record[116..120].copy_from_slice(&self.start.to_le_bytes());
		record[120..124].copy_from_slice(&self.size.to_le_bytes());
		record
	}
}

/// One directory sector holding up to four records; the rest stays unused.
pub fn directory(entries: &[Entry]) -> Vec<u8> {
	let mut sector: Vec<u8> = entries.iter().flat_map(|entry| entry.encode()).collect();
	sector.resize(SECTOR, 0);
	sector
}

pub fn assemble(header: &Header, sectors: &[Vec<u8>]) -> Vec<u8> {
	let mut data = header.to_bytes().to_vec();
	for sector in sectors {
		let mut sector = sector.clone();
		sector.resize(SECTOR, 0);
		data.extend_from_slice(&sector);
	}
	data
}

/// Sector layout of the sample container:
///
/// | sector | content |
/// |---|---|
/// | 0 | FAT |
/// | 1, 7 | directory |
/// | 2, 3 | mini stream (1024 bytes) |
/// | 4 | mini-FAT |
/// | 5, 6 | `Stream1` (600 bytes) |
///
/// Directory: `Root Entry` > { `Stream1`, `Small1` (50 bytes, mini-sector 0),
/// `Sub` > { `Small2` (100 bytes, mini-sectors 7 -> 8) } }. Mini stream cutoff is 512.
pub fn sample_header() -> Header {
	let mut header = header();
	header.mini_stream_cutoff_size = 512;
	header.first_mini_fat_sector_location = 4;
	header.number_of_mini_fat_sectors = 1;
	header
}

pub fn sample_sectors() -> Vec<Vec<u8>> {
	vec![
		ids(&[FATSECT, 7, 3, ENDOFCHAIN, ENDOFCHAIN, 6, ENDOFCHAIN, ENDOFCHAIN]),
		directory(&[
			Entry::root(2, 2, 1024),
			Entry::stream("Stream1", 5, 600),
			Entry::stream("Small1", 0, 50).siblings(1, 3),
			Entry::storage("Sub", 4),
		]),
		pattern(2),
		pattern(3),
		ids(&[ENDOFCHAIN, FREESECT, FREESECT, FREESECT, FREESECT, FREESECT, FREESECT, 8, ENDOFCHAIN]),
		pattern(5),
		pattern(6),
		directory(&[Entry::stream("Small2", 7, 100)]),
	]
}

pub fn sample() -> Vec<u8> {
	assemble(&sample_header(), &sample_sectors())
}

/// Patches one FAT entry of the sample container.
pub fn sample_with_fat_entry(sector: u32, next: u32) -> Vec<u8> {
	let mut sectors = sample_sectors();
	let offset = sector as usize * 4;
	sectors[0][offset..offset + 4].copy_from_slice(&next.to_le_bytes());
	assemble(&sample_header(), &sectors)
}
