//! The machine front end: verifies a compiled artifact and runs it.
//!
//! Inputs are given as a hex byte string (`0f00...`), scans and the
//! ticks advanced between them on the command line. Exit codes: 0 on
//! success, 1 on an I/O failure, 2 on a verify or execution failure.

use std::{env, fs, process};

use plc::{program::Program, vm, vm::Vm};

fn usage() -> ! {
    eprintln!("usage: ilrun <program.bin> [--inputs <hex>] [--scans <n>] [--ticks <n>] [--disasm]");
    process::exit(1);
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|at| u8::from_str_radix(&text[at..at + 2], 16).ok())
        .collect()
}

fn main() {
    let mut arguments = env::args().skip(1);
    let mut path = None;
    let mut inputs = Vec::new();
    let mut scans = 1u32;
    let mut ticks = 0u32;
    let mut disasm = false;

    while let Some(argument) = arguments.next() {
        if argument.starts_with("--") {
            match argument.as_str() {
                "--inputs" => match arguments.next().as_deref().and_then(parse_hex) {
                    Some(bytes) => inputs = bytes,
                    None => usage(),
                },
                "--scans" => match arguments.next().and_then(|n| n.parse().ok()) {
                    Some(n) => scans = n,
                    None => usage(),
                },
                "--ticks" => match arguments.next().and_then(|n| n.parse().ok()) {
                    Some(n) => ticks = n,
                    None => usage(),
                },
                "--disasm" => disasm = true,
                _ => usage(),
            }
        } else if path.is_none() {
            path = Some(argument);
        } else {
            usage();
        }
    }

    let path = match path {
        Some(path) => path,
        None => usage(),
    };

    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Error opening file {}: {}", path, err);
            process::exit(1);
        }
    };

    let program = match Program::new(&path, data) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(2);
        }
    };

    if disasm {
        match vm::disassemble(&program) {
            Ok(listing) => {
                println!("{}", listing);
                return;
            }
            Err(err) => {
                eprintln!("{}", err);
                process::exit(2);
            }
        }
    }

    let mut machine = Vm::new(program);
    machine.set_inputs(&inputs);

    for _ in 0..scans {
        machine.tick(ticks);
        if let Err(err) = machine.scan() {
            eprintln!("{}", err);
            process::exit(2);
        }
    }

    println!("{}", machine);
}
