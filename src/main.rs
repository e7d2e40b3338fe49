//! purple-garden CLI

use clap::Parser as ClapParser;
use purple_garden::dis;
use purple_garden::prelude::*;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Debug, ClapParser)]
#[command(name = "purple-garden", disable_version_flag = true)]
struct Args {
    /// display version information
    #[arg(short = 'v', long)]
    version: bool,

    /// readable bytecode representation with labels, globals and comments
    #[arg(short, long)]
    disassemble: bool,

    /// use block allocator with size (in KB) instead of garbage collection
    #[arg(short, long, value_name = "KB")]
    block_allocator: Option<u64>,

    /// compile all functions to machine code
    #[arg(short, long)]
    aot_functions: bool,

    /// display the memory usage of parsing, compilation and the virtual
    /// machine
    #[arg(short, long)]
    memory_usage: bool,

    /// verbose logging
    #[arg(short = 'V', long)]
    verbose: bool,

    /// show statistics
    #[arg(short, long)]
    stats: bool,

    /// executes the argument as if an input file was given
    #[arg(short, long, value_name = "SOURCE")]
    run: Option<String>,

    /// input file
    #[arg(value_name = "file.garden")]
    file: Option<PathBuf>,
}

struct PhaseTimer {
    enabled: bool,
    last: Instant,
}

impl PhaseTimer {
    fn mark(&mut self, what: &str) {
        if self.enabled {
            println!("[{:10.4}ms] {what}", self.last.elapsed().as_secs_f64() * 1000.0);
            self.last = Instant::now();
        }
    }
}

fn memory_report(phase: &str, stats: purple_garden::arena::Stats) {
    let percent = if stats.allocated == 0 {
        0.0
    } else {
        stats.current as f64 * 100.0 / stats.allocated as f64
    };
    println!(
        "{phase}: {:.2}KB of {:.2}KB used ({percent:.2}%)",
        stats.current as f64 / 1024.0,
        stats.allocated as f64 / 1024.0,
    );
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.version {
        println!("purple_garden: {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if args.verbose {
                    "debug".into()
                } else {
                    "warn".into()
                }
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(args: Args) -> Result<ExitCode, Error> {
    let mut timer = PhaseTimer {
        enabled: args.verbose,
        last: Instant::now(),
    };

    let source = match (&args.run, &args.file) {
        (Some(src), _) if !src.is_empty() => src.clone(),
        (_, Some(path)) => purple_garden::io::read_source(path)?,
        _ => {
            eprintln!("error: Missing a file? try `-h/--help`");
            return Ok(ExitCode::FAILURE);
        }
    };
    timer.mark("io: read input");

    let config = Config {
        max_memory: args.block_allocator.map(|kb| kb as usize * 1024),
        disable_gc: args.block_allocator.is_some(),
        ..Config::default()
    };
    // reserved; parsed for compatibility
    let _ = args.aot_functions;

    let pg = Pg::init(config);
    let mut vm = pg.prepare(&source)?;
    timer.mark("cc: compiled to bytecode and global pool");

    if args.memory_usage {
        memory_report("cc  ", vm.arena_stats());
    }

    if args.disassemble {
        println!("{}", dis::disassemble(vm.program(), vm.interner_ref()));
    }

    vm.run()?;
    timer.mark("vm: executed byte code");

    if args.memory_usage {
        memory_report("vm  ", vm.heap_stats());
    }

    if args.stats {
        println!("{}", dis::opcode_stats(vm.program(), vm.counters()));
    }

    Ok(ExitCode::SUCCESS)
}
