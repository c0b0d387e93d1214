//! barter-engine CLI
//!
//! Run matching turns and drains from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Execute a matching turn over a commitments file
//! barter-engine turn --input commitments.json
//!
//! # Escalate the minimum transferable value over 90-minute windows
//! barter-engine turn --input commitments.json --level 0+3+30 --timespan 90
//!
//! # Drain a bond set with the parallel solver
//! barter-engine drain --input commitments.json --parallel --workers 4
//!
//! # Generate a random commitment network for testing
//! barter-engine generate --traders 1000 --bonds 5000
//! ```

use barter_engine::core::commitment::Commitment;
use barter_engine::matching::matcher::BondMatcher;
use barter_engine::simulation::network::{generate_commitments, NetworkConfig};
use barter_engine::solver::bond_solver::BondSolver;
use barter_engine::turn::executor::match_commitments;
use barter_engine::turn::schedule::ThresholdSchedule;
use barter_engine::turn::writer::{BatchWriter, JsonLinesSink, VecSink};
use rust_decimal::Decimal;
use std::fs;
use std::process;
use std::time::Duration;

fn print_usage() {
    eprintln!(
        r#"barter-engine — circular multilateral barter matching and clearing

USAGE:
    barter-engine <COMMAND> [OPTIONS]

COMMANDS:
    turn        Execute a matching turn over an ordered commitment stream
    drain       Load a commitment file as bonds and drain all deals
    generate    Generate a random commitment network (for testing)
    help        Show this message

OPTIONS (turn):
    --input <FILE>      Path to JSON commitments file
    --level <SPEC>      MTV escalation exponents, e.g. 0+3+30 (default: 0)
    --timespan <MIN>    Duration of each calculation window (default: 60)
    --output <FILE>     Write matched commitments as JSON lines to a file

OPTIONS (drain):
    --input <FILE>      Path to JSON commitments file
    --min <AMOUNT>      Minimum meaningful bond amount (default: 0.01)
    --parallel          Use the parallel solver pool
    --workers <N>       Worker count for --parallel (default: CPU count)

OPTIONS (generate):
    --traders <N>       Number of trader parties (default: 1000)
    --bonds <N>         Number of bonds (default: 5000)
    --products <N>      Number of producer slots (default: 100)
    --seed <N>          RNG seed (default: 1)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    barter-engine turn --input commitments.json --level 0+3 --timespan 90
    barter-engine drain --input commitments.json --min 10 --parallel
    barter-engine generate --traders 200 --bonds 1000 --output test.json"#
    );
}

/// JSON schema for input commitment files.
#[derive(serde::Deserialize)]
struct CommitmentsFile {
    commitments: Vec<Commitment>,
}

fn load_commitments(path: &str) -> Vec<Commitment> {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    let file: CommitmentsFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "commitments": [
    {{ "recipient": 1, "issuer": 2, "slot": 1, "value": "120.00" }}
  ]
}}"#
        );
        process::exit(1);
    });

    file.commitments
}

fn cmd_turn(args: &[String]) {
    let mut input_path = None;
    let mut output_path: Option<String> = None;
    let mut schedule = ThresholdSchedule::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--level" => {
                i += 1;
                let spec = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--level requires a specification like 0+3+30");
                    process::exit(1);
                });
                let parsed: ThresholdSchedule = spec.parse().unwrap_or_else(|e| {
                    eprintln!("Invalid --level '{}': {}", spec, e);
                    process::exit(1);
                });
                schedule.exponents = parsed.exponents;
            }
            "--timespan" => {
                i += 1;
                let minutes: u64 = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--timespan requires a number of minutes");
                        process::exit(1);
                    });
                schedule.timespan = Duration::from_secs(60 * minutes.max(1));
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });
    let commitments = load_commitments(&path);

    if let Some(out) = output_path {
        let file = fs::File::create(&out).unwrap_or_else(|e| {
            eprintln!("Error creating '{}': {}", out, e);
            process::exit(1);
        });
        let mut writer = BatchWriter::new(JsonLinesSink::new(file));
        let report = match_commitments(commitments, &mut writer, &schedule)
            .unwrap_or_else(|e| {
                eprintln!("Error writing matched commitments: {}", e);
                process::exit(1);
            });
        println!("{}", report);
        eprintln!("Matched commitments written to {}", out);
    } else {
        let mut writer = BatchWriter::new(VecSink::new());
        let report = match_commitments(commitments, &mut writer, &schedule)
            .unwrap_or_else(|e| {
                eprintln!("Error buffering matched commitments: {}", e);
                process::exit(1);
            });

        #[derive(serde::Serialize)]
        struct TurnOutput<'a> {
            report: &'a barter_engine::turn::executor::TurnReport,
            matched_commitments: &'a [Commitment],
        }

        let output = TurnOutput {
            report: &report,
            matched_commitments: writer.sink().rows(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    }
}

fn cmd_drain(args: &[String]) {
    let mut input_path = None;
    let mut min_amount = ThresholdSchedule::base_mtv();
    let mut parallel = false;
    let mut workers: Option<usize> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--min" => {
                i += 1;
                min_amount = args
                    .get(i)
                    .and_then(|s| s.parse::<Decimal>().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--min requires a positive amount");
                        process::exit(1);
                    });
            }
            "--parallel" => parallel = true,
            "--workers" => {
                i += 1;
                workers = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(
                    || {
                        eprintln!("--workers requires a number");
                        process::exit(1);
                    },
                ));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });
    let commitments = load_commitments(&path);

    let mut performed_deals = 0usize;
    let mut cleared_amount = Decimal::ZERO;

    if parallel {
        let pool_size = workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        });
        let mut solver = BondSolver::new(min_amount);
        for c in &commitments {
            let (u, v, amount) = c.to_bond();
            solver.register_bond(u, v, amount);
        }
        solver.start(pool_size);
        while let Ok(deal) = solver.wait_for_deal() {
            performed_deals += 1;
            cleared_amount += deal.cleared_total();
        }
        solver.stop();
    } else {
        let mut matcher = BondMatcher::new(min_amount);
        for c in &commitments {
            let (u, v, amount) = c.to_bond();
            matcher.register_bond(u, v, amount);
        }
        matcher.start();
        while let Some(deal) = matcher.find_deal() {
            performed_deals += 1;
            cleared_amount += deal.cleared_total();
        }
    }

    println!("Performed deals: {}", performed_deals);
    println!("Cleared amount:  {}", cleared_amount);
}

fn cmd_generate(args: &[String]) {
    let mut config = NetworkConfig::default();
    let mut seed = 1u64;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--traders" => {
                i += 1;
                config.trader_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--traders requires a number");
                        process::exit(1);
                    });
            }
            "--bonds" => {
                i += 1;
                config.bond_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--bonds requires a number");
                        process::exit(1);
                    });
            }
            "--products" => {
                i += 1;
                config.product_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--products requires a number");
                        process::exit(1);
                    });
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a number");
                    process::exit(1);
                });
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    #[derive(serde::Serialize)]
    struct OutputFile {
        commitments: Vec<Commitment>,
    }

    let output = OutputFile {
        commitments: generate_commitments(&config, seed),
    };
    let json = serde_json::to_string_pretty(&output).unwrap();

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} commitments across {} traders → {}",
            output.commitments.len(),
            config.trader_count,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "turn" => cmd_turn(rest),
        "drain" => cmd_drain(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
