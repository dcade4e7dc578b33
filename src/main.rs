use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use intcode::ascii::{AsciiMachine, OutputMode};
use intcode::decode::disassemble;
use intcode::machine::{Machine, Status};

#[derive(Parser)]
#[command(name = "intcode", about = "Intcode interpreter: run or inspect a program image")]
struct Cli {
    /// Path to the program image (comma-separated integers).
    image: PathBuf,

    /// Comma-separated input values to queue before running.
    #[arg(long)]
    input: Option<String>,

    /// Interactive text mode: decode output as text and read input lines
    /// from stdin while the program waits.
    #[arg(long)]
    ascii: bool,

    /// Print a disassembly of the program image instead of running it.
    #[arg(long)]
    disassemble: bool,
}

fn main() {
    let cli = Cli::parse();

    let image = match fs::read_to_string(&cli.image) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", cli.image.display());
            std::process::exit(1);
        }
    };

    let result = if cli.disassemble {
        print_disassembly(&image)
    } else if cli.ascii {
        run_ascii(&image)
    } else {
        run_numeric(&image, cli.input.as_deref())
    };

    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn print_disassembly(image: &str) -> Result<(), String> {
    let machine = Machine::from_image(image).map_err(|e| e.to_string())?;
    print!("{}", disassemble(machine.snapshot().memory));
    Ok(())
}

/// Run in raw integer mode: pre-seeded inputs first, then one integer per
/// stdin line whenever the program blocks. Outputs print one per line.
fn run_numeric(image: &str, input: Option<&str>) -> Result<(), String> {
    let mut machine = Machine::from_image(image).map_err(|e| e.to_string())?;
    if let Some(input) = input {
        for token in input.split(',') {
            let value = token
                .trim()
                .parse()
                .map_err(|e| format!("Invalid input value {:?}: {e}", token.trim()))?;
            machine.supply_input(value).map_err(|e| e.to_string())?;
        }
    }

    let stdin = io::stdin();
    loop {
        for value in machine.run().map_err(|e| e.to_string())? {
            println!("{value}");
        }
        if machine.status() == Status::Halted {
            return Ok(());
        }

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("program is blocked on input and stdin is closed".to_string());
        }
        let value = line
            .trim()
            .parse()
            .map_err(|e| format!("Expected an integer, got {:?}: {e}", line.trim()))?;
        machine.supply_input(value).map_err(|e| e.to_string())?;
    }
}

/// Interactive text session: print decoded output, read a line from stdin
/// whenever the program blocks, send it, repeat until the program halts.
fn run_ascii(image: &str) -> Result<(), String> {
    let mut machine =
        AsciiMachine::from_image(image, OutputMode::Text).map_err(|e| e.to_string())?;
    let stdin = io::stdin();
    let mut output = machine.run().map_err(|e| e.to_string())?;
    loop {
        if let Some(text) = output.text() {
            print!("{text}");
            io::stdout().flush().ok();
        }
        if machine.status() == Status::Halted {
            return Ok(());
        }

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("program is blocked on input and stdin is closed".to_string());
        }
        let line = line.trim_end_matches(['\r', '\n']);
        output = machine.send(line).map_err(|e| e.to_string())?;
    }
}
