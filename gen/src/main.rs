use std::env::args;
use std::io::{BufWriter, Write};
use std::process::exit;

fn main() {
    let argv: Vec<String> = args().collect();
    let (count, seed) = match &argv[..] {
        [_, count] => (count.parse::<usize>().ok(), Some(0)),
        [_, count, flag, seed] if flag == "--seed" => {
            (count.parse::<usize>().ok(), seed.parse::<u64>().ok())
        }
        _ => (None, None),
    };
    let (Some(count), Some(seed)) = (count, seed) else {
        eprintln!("Usage: gen <count> [--seed N]");
        exit(1);
    };

    let stdlock = std::io::stdout().lock();
    let mut bufout = BufWriter::new(stdlock);
    for (station, temp) in gen::gen(count, seed) {
        if writeln!(bufout, "{station};{temp:.1}").is_err() {
            // reader went away
            exit(0);
        }
    }
    let _ = bufout.flush();
}
