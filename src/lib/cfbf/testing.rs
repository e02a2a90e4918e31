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

//! Helpers for building small in-memory containers in unit tests.

use super::structures::*;
use std::io::Cursor;
use std::sync::Mutex;

/// A version 3 header (512-byte sectors, 64-byte mini-sectors) with every location unset.
pub fn header(number_of_fat_sectors: u32) -> Header {
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
		number_of_fat_sectors,
		first_directory_sector_location: ENDOFCHAIN,
		transaction_signature: 0,
		mini_stream_cutoff_size: 4096,
		first_mini_fat_sector_location: ENDOFCHAIN,
		number_of_mini_fat_sectors: 0,
		first_difat_sector_location: ENDOFCHAIN,
		number_of_difat_sectors: 0,
		difat: [FREESECT; HEADER_DIFAT_ENTRIES],
	}
}

/// One 512-byte sector holding the given sector ids, padded with `FREESECT`.
pub fn ids(values: &[u32]) -> Vec<u8> {
	let mut sector = Vec::with_capacity(512);
	for value in values.iter().chain(std::iter::repeat(&FREESECT)).take(128) {
		sector.extend_from_slice(&value.to_le_bytes());
	}
	sector
}

/// One 512-byte sector filled with `byte`.
pub fn filled(byte: u8) -> Vec<u8> {
	vec![byte; 512]
}

/// Header followed by the given sectors, each padded (or cut) to 512 bytes.
pub fn image(header: &Header, sectors: &[Vec<u8>]) -> Mutex<Cursor<Vec<u8>>> {
	let mut data = header.to_bytes().to_vec();
	for sector in sectors {
		let mut sector = sector.clone();
		sector.resize(512, 0);
		data.extend_from_slice(&sector);
	}
	Mutex::new(Cursor::new(data))
}
