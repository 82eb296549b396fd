//! The compiler front end: reads instruction list text and writes the
//! framed binary artifact next to it.
//!
//! Exit codes: 0 on success, 1 on an I/O failure, 2 on a compile
//! failure.

use std::{env, fs, process};

use plc::{compiler, vm};

fn usage() -> ! {
    eprintln!("usage: ilc <source.il> [output.bin] [--hex]");
    process::exit(1);
}

fn main() {
    let mut source_path = None;
    let mut output_path = None;
    let mut hex = false;

    for argument in env::args().skip(1) {
        if argument == "--hex" {
            hex = true;
        } else if source_path.is_none() {
            source_path = Some(argument);
        } else if output_path.is_none() {
            output_path = Some(argument);
        } else {
            usage();
        }
    }

    let source_path = match source_path {
        Some(path) => path,
        None => usage(),
    };
    let output_path = output_path.unwrap_or_else(|| {
        let base = source_path.trim_end_matches(".il");
        format!("{}.bin", base)
    });

    let source = match fs::read_to_string(&source_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error opening file {}: {}", source_path, err);
            process::exit(1);
        }
    };

    let output = match compiler::compile(&source) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(2);
        }
    };
    for warning in &output.warnings {
        eprintln!("warning: {}", warning);
    }

    if hex {
        println!("{}", vm::hex_dump(&output.binary));
    }

    if let Err(err) = fs::write(&output_path, &output.binary) {
        eprintln!("Error writing file {}: {}", output_path, err);
        process::exit(1);
    }

    println!("Compiled successfully ({} bytes)", output.binary.len());
}
