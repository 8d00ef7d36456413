/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The `chip8dump` binary program.
//!
//! Loads a program into a fresh CPU and prints the machine state: registers,
//! timers, and a hex dump of memory.

extern crate chip8_cpu;
extern crate clap;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use clap::{App, Arg, ArgMatches};
use failure::{Error, ResultExt};
use log::LevelFilter;

use chip8_cpu::cpu::DEFAULT_SEED;
use chip8_cpu::{Cpu, Options, Register, PROG_START};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The number of bytes shown on each line of the memory dump.
const LINE_LEN: usize = 16;

fn main() {
    let matches = App::new("chip8dump")
        .version(VERSION)
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("Dumps the initial state of a Chip-8 machine")
        .help_message("show this help message and exit")
        .version_message("show this version information and exit")
        .arg(
            Arg::with_name("all")
                .short("a")
                .long("all")
                .help("dump all of memory, including empty lines"),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .help("set the random number generator seed")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("stack-size")
                .long("stack-size")
                .value_name("SIZE")
                .help("set the capacity of the call stack")
                .takes_value(true)
                .default_value("16"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase verbosity"),
        )
        .arg(
            Arg::with_name("FILE")
                .help("set the program file")
                .default_value("-")
                .index(1),
        )
        .get_matches();

    let verbosity = matches.occurrences_of("verbose");
    let filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, filter)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.causes().skip(1) {
            info!("caused by: {}", cause);
        }
        trace!("backtrace: {}", e.backtrace());
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut opts = Options::new();
    if let Some(seed) = matches.value_of("seed") {
        let seed = seed.parse::<u32>()
            .with_context(|_| format!("invalid seed '{}'", seed))?;
        let mut words = DEFAULT_SEED;
        words[3] = seed;
        opts.seed = Some(words);
    }
    let stack_size = matches.value_of("stack-size").unwrap();
    opts.stack_size = stack_size
        .parse::<usize>()
        .with_context(|_| format!("invalid stack size '{}'", stack_size))?;

    let input_file = matches.value_of("FILE").unwrap();
    let stdin = io::stdin();
    let mut input: Box<Read> = if input_file == "-" {
        Box::new(stdin.lock())
    } else {
        Box::new(File::open(input_file)
            .with_context(|_| format!("could not open input file '{}'", input_file))?)
    };

    let mut cpu = Cpu::with_options(opts);
    cpu.load_program(&mut input)
        .with_context(|_| format!("could not load program '{}'", input_file))?;
    info!("loaded '{}'", input_file);

    let stdout = io::stdout();
    let mut output = stdout.lock();
    dump_registers(&cpu, &mut output)?;
    writeln!(output)?;
    dump_memory(&cpu, &mut output, matches.is_present("all"))?;

    Ok(())
}

/// Writes the registers, timers and stack state.
fn dump_registers<W: Write>(cpu: &Cpu, output: &mut W) -> Result<(), Error> {
    for (i, val) in cpu.registers().iter().enumerate() {
        let reg = Register::from_index(i as u8)?;
        write!(output, "{}={:02X}", reg, val)?;
        if i % 8 == 7 {
            writeln!(output)?;
        } else {
            write!(output, " ")?;
        }
    }
    writeln!(
        output,
        "PC={:03X} I={:03X} DT={:02X} ST={:02X}",
        cpu.pc(),
        cpu.i(),
        cpu.dt(),
        cpu.st()
    )?;
    match cpu.stack() {
        Ok(top) => writeln!(output, "stack: depth {}, top {:03X}", cpu.stack_depth(), top)?,
        Err(_) => writeln!(output, "stack: empty")?,
    }
    Ok(())
}

/// Writes a hex dump of memory.
///
/// Unless `all` is set, lines that are entirely zero are skipped.
fn dump_memory<W: Write>(cpu: &Cpu, output: &mut W, all: bool) -> Result<(), Error> {
    for (n, line) in cpu.mem().chunks(LINE_LEN).enumerate() {
        if !all && line.iter().all(|&b| b == 0) {
            continue;
        }
        let addr = n * LINE_LEN;
        let marker = if addr == PROG_START { ">" } else { " " };
        write!(output, "{}{:03X}:", marker, addr)?;
        for b in line {
            write!(output, " {:02X}", b)?;
        }
        writeln!(output)?;
    }
    Ok(())
}
