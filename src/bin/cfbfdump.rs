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

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use oleread::cfbf::{Container, DirectoryEntry};
use oleread::io::seekable;
use oleread::{Error, Result};
use std::fs::File;
use std::io::{copy, stdin, stdout, BufWriter, Read, Seek, Write};

trait ReadSeek: Read + Seek { }
impl<T> ReadSeek for T where T: Read + Seek { }

fn input_arg() -> Arg {
	Arg::new("input")
		.value_name("FILE")
		.help("A file in Compound File Binary File Format (CFBF). If omitted, the file will be read from STDIN instead.")
		.short('i')
		.long("input")
		.required(false)
}

fn main() {
	let matches = Command::new("cfbfdump")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Steve Muller <steve.muller@outlook.com>")
		.about("This utility reads a Compound File Binary File Format (also known as OLE file, COM file, or Structured Storage file) and dumps its contents.")
		.subcommand_required(true)
		.arg(Arg::new("verbose")
			.short('v')
			.help("Increases the log verbosity. Log messages are printed to standard error (STDERR). Can be used up to 3 times. RUST_LOG overrides this.")
			.action(ArgAction::Count)
			.global(true))
		.subcommand(Command::new("info")
			.about("Prints the geometry of the CFBF file: sector sizes, allocation tables and directory size.")
			.arg(input_arg())
		)
		.subcommand(Command::new("list")
			.about("Lists all entries contained in the CFBF file. Each output line represents an entry, and contains the internal entry ID and the path, separated by a space. Storages end in '/', streams are followed by their size.")
			.arg(input_arg())
		)
		.subcommand(Command::new("dump")
			.about("Dumps a stream from the CFBF file.")
			.arg(Arg::new("id")
				.value_name("STREAMID")
				.help("The ID of the stream that shall be dumped.")
				.long("id")
				.value_parser(value_parser!(u32))
				.conflicts_with("name")
				.required_unless_present("name"))
			.arg(Arg::new("name")
				.value_name("NAME")
				.help("The name of the stream that shall be dumped. The first entry with this name is used.")
				.long("name"))
			.arg(Arg::new("output")
				.value_name("FILE")
				.help("The file where the stream shall be written to. If this parameter is not specified (or has the value '-'), the stream will be written to STDOUT instead.")
				.short('o')
				.long("output")
				.required(false))
			.arg(input_arg())
		)
	.get_matches();

	init_logging(matches.get_count("verbose"));

	if let Err(e) = dispatch(&matches) {
		eprintln!("ERROR: {}", e);
		std::process::exit(1);
	}
}

fn init_logging(verbosity: u8) {
	let level = match verbosity {
		0 => LevelFilter::Warn,
		1 => LevelFilter::Info,
		2 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};
	env_logger::Builder::new()
		.filter_level(level)
		.parse_default_env()
		.format_timestamp(None)
		.init();
}

fn dispatch(matches: &ArgMatches) -> Result<()> {
	match matches.subcommand() {
		Some(("info", submatches)) => dispatch_info(submatches),
		Some(("list", submatches)) => dispatch_list(submatches),
		Some(("dump", submatches)) => dispatch_dump(submatches),
		_ => unreachable!("clap enforces a subcommand"),
	}
}

fn open_input(matches: &ArgMatches) -> Result<Container<Box<dyn ReadSeek>>> {
	let inputfile = matches.get_one::<String>("input").map(String::as_str).unwrap_or("-");
	let input: Box<dyn ReadSeek> = match inputfile {
		"" | "-" => Box::new(seekable(stdin())?),
		_ => Box::new(File::open(inputfile)?),
	};
	Container::open(input)
}

fn dispatch_info(matches: &ArgMatches) -> Result<()> {
	let container = open_input(matches)?;
	let output = stdout();
	write_info(&container, &mut output.lock())
}

fn write_info<R: Read + Seek>(container: &Container<R>, output: &mut impl Write) -> Result<()> {
	let header = container.header();
	writeln!(output, "version:            {}.{}", header.major_version, header.minor_version)?;
	writeln!(output, "sector size:        {}", header.sector_size)?;
	writeln!(output, "mini sector size:   {}", header.mini_sector_size)?;
	writeln!(output, "mini stream cutoff: {}", header.mini_stream_cutoff_size)?;
	writeln!(output, "sectors:            {}", container.sector_count())?;
	writeln!(output, "FAT:                {} sectors, {} entries", header.number_of_fat_sectors, container.fat().len())?;
	writeln!(output, "DIFAT:              {} sectors", header.number_of_difat_sectors)?;
	writeln!(output, "mini-FAT:           {} sectors, {} entries", header.number_of_mini_fat_sectors, container.mini_fat().len())?;
	writeln!(output, "mini stream:        {} bytes", container.root().stream_size)?;
	writeln!(output, "directory entries:  {}", container.entries().len())?;
	Ok(())
}

fn dispatch_list(matches: &ArgMatches) -> Result<()> {
	let container = open_input(matches)?;
	let output = stdout();
	write_list(&container, &mut output.lock())
}

/// One line per entry reachable from the root: `<id> <path>/` for storages, `<id> <path> (<size> bytes)` for streams.
fn write_list<R: Read + Seek>(container: &Container<R>, output: &mut impl Write) -> Result<()> {
	for (entry, path) in container.directory().paths() {
		if entry.is_storage() {
			writeln!(output, "{} {}/", entry.id, path)?;
		}
		else {
			writeln!(output, "{} {} ({} bytes)", entry.id, path, entry.stream_size)?;
		}
	}
	Ok(())
}

fn dispatch_dump(matches: &ArgMatches) -> Result<()> {
	let outputfile = matches.get_one::<String>("output").map(String::as_str).unwrap_or("-");
	let container = open_input(matches)?;

	let entry: &DirectoryEntry = match (matches.get_one::<u32>("id"), matches.get_one::<String>("name")) {
		(Some(&id), _) => container.directory().get(id).ok_or_else(|| Error::NotFound(format!("#{}", id)))?,
		(None, Some(name)) => container.find(name).ok_or_else(|| Error::NotFound(name.clone()))?,
		(None, None) => unreachable!("clap requires --id or --name"),
	};
	let mut stream = container.open_stream(entry)?;

	let mut output: Box<dyn Write> = match outputfile {
		"" | "-" => Box::new(BufWriter::new(stdout())),
		_ => Box::new(BufWriter::new(File::create(outputfile)?)),
	};
	let written = copy(&mut stream, &mut output)?;
	output.flush()?;
	if written < entry.stream_size {
		log::warn!("Stream '{}' is damaged: recovered {} of {} bytes", entry.name, written, entry.stream_size);
	}
	Ok(())
}
