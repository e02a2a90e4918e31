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

//! Read-only access to Compound File Binary containers (also known as OLE files,
//! COM files or Structured Storage files).
//!
//! A container is opened once with [`Container::open`], which parses the header,
//! the allocation tables and the directory. Each stream is then read through a
//! [`StreamReader`], which implements `Read + Seek` over the stream's bytes.

#[macro_use]
extern crate log;

pub mod cfbf;
pub mod error;
pub mod io;

pub use cfbf::{Allocation, Container, DirectoryEntry, EntryType, StreamReader};
pub use error::{Error, Result};
