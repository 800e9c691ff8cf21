//! Simple command that prints one or 'count' UUIDv7 strings

use std::{env, io, io::Write, process::ExitCode};

fn main() -> io::Result<ExitCode> {
    let mut args = env::args();
    let program = args.next();
    let count = match (args.next().as_deref().map(str::parse::<usize>), args.next()) {
        (None, _) => 1,
        (Some(Ok(count)), None) => count,
        _ => {
            eprintln!("Usage: {} [count]", program.as_deref().unwrap_or("pkuid"));
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut buf = io::BufWriter::new(io::stdout());
    for _ in 0..count {
        writeln!(buf, "{}", pkuid::pkuid())?;
    }

    Ok(ExitCode::SUCCESS)
}
