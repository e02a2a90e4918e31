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

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
	/// The source is not a compound file at all (bad magic, bad byte order, unusable geometry).
	#[error("not a valid compound file: {0}")]
	InvalidFormat(String),
	/// A structure shared by the whole container (FAT, DIFAT, mini-FAT, directory) is damaged.
	#[error("corrupt compound file: {0}")]
	Corrupt(String),
	#[error("no such entry: {0}")]
	NotFound(String),
	#[error("entry '{0}' is not a stream")]
	NotAStream(String),
}

impl From<Error> for io::Error {
	fn from(error: Error) -> io::Error {
		match error {
			Error::Io(e) => e,
			Error::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, error),
			other => io::Error::new(io::ErrorKind::InvalidData, other),
		}
	}
}
