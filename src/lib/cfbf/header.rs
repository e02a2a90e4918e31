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

impl Header {
	/// Decodes and validates the fixed 512-byte preamble of a CFBF file.
	pub fn parse(buffer: &[u8; HEADER_SIZE]) -> Result<Header> {
		let signature = le_u64(buffer, 0);
		if signature != HEADER_SIGNATURE {
			return Err(Error::InvalidFormat(format!("bad signature {:#018X}", signature)));
		}
		let byte_order = le_u16(buffer, 28);
		if byte_order != BYTE_ORDER_MARK {
			return Err(Error::InvalidFormat(format!("bad byte order mark {:#06X}", byte_order)));
		}

		let sector_shift = le_u16(buffer, 30);
		let mini_sector_shift = le_u16(buffer, 32);
		// 512-byte sectors (version 3) or 4096-byte sectors (version 4)
		if sector_shift != 9 && sector_shift != 12 {
			return Err(Error::InvalidFormat(format!("unsupported sector shift {}", sector_shift)));
		}
		if mini_sector_shift > sector_shift {
			return Err(Error::InvalidFormat(format!("mini sector shift {} exceeds sector shift {}", mini_sector_shift, sector_shift)));
		}

		let mut clsid = [0u8; 16];
		clsid.copy_from_slice(&buffer[8..24]);
		let mut reserved = [0u8; 6];
		reserved.copy_from_slice(&buffer[34..40]);
		let mut difat = [FREESECT; HEADER_DIFAT_ENTRIES];
		for (slot, id) in difat.iter_mut().zip(sector_ids(&buffer[76..HEADER_SIZE])) {
			*slot = id;
		}

		Ok(Header {
			signature,
			clsid,
			minor_version: le_u16(buffer, 24),
			major_version: le_u16(buffer, 26),
			byte_order,
			sector_shift,
			sector_size: 1 << sector_shift,
			mini_sector_shift,
			mini_sector_size: 1 << mini_sector_shift,
			reserved,
			number_of_directory_sectors: le_u32(buffer, 40),
			number_of_fat_sectors: le_u32(buffer, 44),
			first_directory_sector_location: le_u32(buffer, 48),
			transaction_signature: le_u32(buffer, 52),
			mini_stream_cutoff_size: le_u32(buffer, 56),
			first_mini_fat_sector_location: le_u32(buffer, 60),
			number_of_mini_fat_sectors: le_u32(buffer, 64),
			first_difat_sector_location: le_u32(buffer, 68),
			number_of_difat_sectors: le_u32(buffer, 72),
			difat,
		})
	}

	/// Encodes the header back into its on-disk layout.
	pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
		let mut buffer = [0u8; HEADER_SIZE];
		buffer[0..8].copy_from_slice(&self.signature.to_le_bytes());
		buffer[8..24].copy_from_slice(&self.clsid);
		buffer[24..26].copy_from_slice(&self.minor_version.to_le_bytes());
		buffer[26..28].copy_from_slice(&self.major_version.to_le_bytes());
		buffer[28..30].copy_from_slice(&self.byte_order.to_le_bytes());
		buffer[30..32].copy_from_slice(&self.sector_shift.to_le_bytes());
		buffer[32..34].copy_from_slice(&self.mini_sector_shift.to_le_bytes());
		buffer[34..40].copy_from_slice(&self.reserved);
		let fields = [
			self.number_of_directory_sectors,
			self.number_of_fat_sectors,
			self.first_directory_sector_location,
			self.transaction_signature,
			self.mini_stream_cutoff_size,
			self.first_mini_fat_sector_location,
			self.number_of_mini_fat_sectors,
			self.first_difat_sector_location,
			self.number_of_difat_sectors,
		];
		for (i, value) in fields.iter().chain(self.difat.iter()).enumerate() {
			let offset = 40 + i * 4;
			buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
		}
		buffer
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> [u8; HEADER_SIZE] {
		let mut buffer = [0u8; HEADER_SIZE];
		buffer[0..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
		buffer[24..26].copy_from_slice(&0x3Eu16.to_le_bytes());
		buffer[26..28].copy_from_slice(&3u16.to_le_bytes());
		buffer[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
		buffer[30..32].copy_from_slice(&9u16.to_le_bytes());
		buffer[32..34].copy_from_slice(&6u16.to_le_bytes());
		buffer[44..48].copy_from_slice(&1u32.to_le_bytes());
		buffer[48..52].copy_from_slice(&1u32.to_le_bytes());
		buffer[56..60].copy_from_slice(&4096u32.to_le_bytes());
		buffer[60..64].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
		buffer[68..72].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
		for chunk in buffer[76..].chunks_exact_mut(4) {
			chunk.copy_from_slice(&FREESECT.to_le_bytes());
		}
		buffer[76..80].copy_from_slice(&0u32.to_le_bytes());
		buffer
	}

	#[test]
	fn parses_geometry() {
		let header = Header::parse(&sample()).unwrap();
		assert_eq!(header.sector_size, 512);
		assert_eq!(header.mini_sector_size, 64);
		assert_eq!(header.major_version, 3);
		assert_eq!(header.number_of_fat_sectors, 1);
		assert_eq!(header.first_directory_sector_location, 1);
		assert_eq!(header.mini_stream_cutoff_size, 4096);
		assert_eq!(header.first_mini_fat_sector_location, ENDOFCHAIN);
		assert_eq!(header.difat[0], 0);
		assert_eq!(header.difat[1], FREESECT);
		assert_eq!(header.sector_position(0), 512);
		assert_eq!(header.ids_per_sector(), 128);
	}

	#[test]
	fn encodes_back_to_the_same_bytes() {
		let mut bytes = sample();
		bytes[8] = 0x42; // clsid
		bytes[35] = 0x07; // reserved
		bytes[52] = 0x11; // transaction signature
		let header = Header::parse(&bytes).unwrap();
		assert_eq!(header.to_bytes()[..], bytes[..]);
	}

	#[test]
	fn rejects_bad_signature() {
		let mut bytes = sample();
		bytes[0] = 0x50;
		assert!(matches!(Header::parse(&bytes), Err(Error::InvalidFormat(_))));
	}

	#[test]
	fn rejects_bad_byte_order() {
		let mut bytes = sample();
		bytes[28..30].copy_from_slice(&0xFEFFu16.to_le_bytes());
		assert!(matches!(Header::parse(&bytes), Err(Error::InvalidFormat(_))));
	}

	#[test]
	fn rejects_unaddressable_geometry() {
		let mut bytes = sample();
		bytes[30..32].copy_from_slice(&40u16.to_le_bytes());
		assert!(matches!(Header::parse(&bytes), Err(Error::InvalidFormat(_))));

		let mut bytes = sample();
		bytes[30..32].copy_from_slice(&7u16.to_le_bytes());
		bytes[32..34].copy_from_slice(&6u16.to_le_bytes());
		assert!(matches!(Header::parse(&bytes), Err(Error::InvalidFormat(_))));

		let mut bytes = sample();
		bytes[32..34].copy_from_slice(&10u16.to_le_bytes());
		assert!(matches!(Header::parse(&bytes), Err(Error::InvalidFormat(_))));
	}

	#[test]
	fn accepts_version_4_geometry() {
		let mut bytes = sample();
		bytes[26..28].copy_from_slice(&4u16.to_le_bytes());
		bytes[30..32].copy_from_slice(&12u16.to_le_bytes());
		let header = Header::parse(&bytes).unwrap();
		assert_eq!(header.sector_size, 4096);
		assert_eq!(header.sector_position(0), 4096);
		assert_eq!(header.sector_position(2), 3 * 4096);
	}
}
