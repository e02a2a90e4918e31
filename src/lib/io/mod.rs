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

use std::io::{Cursor, Error, ErrorKind, Read, Seek, SeekFrom};
use std::sync::Mutex;

/// Positioned reads: every call names the absolute offset it reads from, so that
/// no caller depends on a cursor left behind by another one.
pub trait ReadAt {
	/// Reads up to `buf.len()` bytes starting at `pos`. Returns 0 once there is no more data.
	fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize, Error>;

	/// Fills all of `buf` from `pos`, or fails with `UnexpectedEof` if the data ends first.
	fn read_exact_at(&mut self, mut pos: u64, mut buf: &mut [u8]) -> Result<(), Error> {
		while !buf.is_empty() {
			match self.read_at(pos, buf) {
				Ok(0) => return Err(Error::new(ErrorKind::UnexpectedEof, "Source ended before the requested range")),
				Ok(n) => {
					pos += n as u64;
					buf = &mut buf[n..];
				}
				Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
				Err(e) => return Err(e),
			}
		}
		Ok(())
	}
}

/// Handle on the random-access source of a container.
///
/// The source lives in a mutex owned by the container; each `read_at` holds the lock
/// across its seek and read, so handles can be used from several readers (and threads)
/// at once.
pub struct SharedSource<'a, R> {
	source: &'a Mutex<R>,
}

impl<'a, R> SharedSource<'a, R> {
	pub fn new(source: &'a Mutex<R>) -> SharedSource<'a, R> {
		SharedSource { source }
	}
}

impl<'a, R> Clone for SharedSource<'a, R> {
	fn clone(&self) -> Self {
		SharedSource { source: self.source }
	}
}

impl<'a, R> ReadAt for SharedSource<'a, R> where R: Read + Seek {
	fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize, Error> {
		let mut source = self.source.lock().map_err(|_| Error::new(ErrorKind::Other, "Source lock poisoned"))?;
		source.seek(SeekFrom::Start(pos))?;
		let mut have_read = 0;
		while have_read < buf.len() {
			match source.read(&mut buf[have_read..]) {
				Ok(0) => break,
				Ok(n) => have_read += n,
				Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
				Err(e) => return Err(e),
			}
		}
		Ok(have_read)
	}
}

/// Returns the total length of a seekable source, leaving its position at the start.
pub fn source_len<R: Seek>(source: &mut R) -> Result<u64, Error> {
	let len = source.seek(SeekFrom::End(0))?;
	source.seek(SeekFrom::Start(0))?;
	Ok(len)
}

/// Buffers a non-seekable input (e.g. STDIN) in memory so that it can be opened as a container.
pub fn seekable(mut read: impl Read) -> Result<Cursor<Vec<u8>>, Error> {
	let mut data: Vec<u8> = Vec::new();
	read.read_to_end(&mut data)?;
	Ok(Cursor::new(data))
}
