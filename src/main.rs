//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8-emu run <program>` - Run an `.ls8` file until it halts
//! - `ls8-emu disasm <program>` - Disassemble an `.ls8` file
//! - `ls8-emu selftest` - Run the bundled demo programs

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the LS-8 8-bit computer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .ls8 file to execute
        program: String,
        /// Maximum number of cycles to run (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Log a trace line before every instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON on stderr
        #[arg(short, long)]
        dump_state: bool,
    },
    /// Disassemble a program to readable text
    Disasm {
        /// Path to the .ls8 file
        program: String,
    },
    /// Run the bundled demo programs and check their output
    Selftest,
}

fn main() {
    let cli = Cli::parse();

    let level = match &cli.command {
        Commands::Run { trace: true, .. } => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("failed to initialize logger: {}", e);
    }

    match cli.command {
        Commands::Run { program, max_cycles, dump_state, .. } => {
            run_program(&program, max_cycles, dump_state);
        }
        Commands::Disasm { program } => {
            disassemble_file(&program);
        }
        Commands::Selftest => {
            run_self_test();
        }
    }
}

fn run_program(path: &str, max_cycles: u64, dump_state: bool) {
    use ls8::{load_program, Machine, RunOutcome};

    let program = match load_program(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let mut machine = Machine::new();
    if let Err(e) = machine.load(&program.bytes) {
        eprintln!("Failed to load program: {}", e);
        std::process::exit(1);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let outcome = match machine.run_limited(&mut out, max_cycles) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("CPU error at PC={:#04x}: {}", machine.pc, e);
            std::process::exit(1);
        }
    };

    match outcome {
        // Unknown opcodes are already reported through the logger
        RunOutcome::Halted | RunOutcome::UnknownInstruction { .. } => {}
        RunOutcome::CycleLimit => {
            eprintln!("Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
        }
    }

    if dump_state {
        match serde_json::to_string_pretty(&machine) {
            Ok(json) => eprintln!("{}", json),
            Err(e) => eprintln!("Failed to serialize machine state: {}", e),
        }
    }
}

fn disassemble_file(path: &str) {
    use ls8::{disassemble, load_program};

    let program = match load_program(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    print!("{}", disassemble(&program.bytes));
}

fn run_self_test() {
    use ls8::{parse_program, Machine, RunOutcome};

    const DEMOS: [(&str, &str, &str); 5] = [
        ("print8", include_str!("../demos/print8.ls8"), "8\n"),
        ("mult", include_str!("../demos/mult.ls8"), "72\n"),
        ("stack", include_str!("../demos/stack.ls8"), "2\n4\n1\n"),
        ("call", include_str!("../demos/call.ls8"), "20\n30\n36\n60\n"),
        ("sctest", include_str!("../demos/sctest.ls8"), "1\n2\n"),
    ];

    println!("LS-8 Emulator Self-Test");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    for (name, source, expected) in DEMOS {
        print!("{}... ", name);

        let result = parse_program(source)
            .map_err(|e| e.to_string())
            .and_then(|program| {
                let mut machine = Machine::new();
                machine.load(&program.bytes).map_err(|e| e.to_string())?;
                let mut out = Vec::new();
                let outcome = machine.run(&mut out).map_err(|e| e.to_string())?;
                Ok((outcome, String::from_utf8_lossy(&out).into_owned()))
            });

        match result {
            Ok((RunOutcome::Halted, output)) if output == expected => {
                println!("ok");
                passed += 1;
            }
            Ok((outcome, output)) => {
                println!("FAILED ({:?}, output {:?}, expected {:?})", outcome, output, expected);
                failed += 1;
            }
            Err(e) => {
                println!("FAILED ({})", e);
                failed += 1;
            }
        }
    }

    println!();
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}
