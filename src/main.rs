use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use unitcalc::calc::{self, Command, Token};
use unitcalc::config::Config;
use unitcalc::dim::registry;

const OPERATORS_HELP: &str = "\
Operators (applied to the top two values):
  +  add plus       -  sub minus      *  x mul times     /  div divide
  // floordiv       %  mod            ^  ** pow

Stack ops:
  copy  duplicate the top value        pop   drop the top value
  swap  exchange the top two values    rev   reverse the stack
  rol   move the bottom value to top   ror   move the top value to bottom

Commands:
  help  show this text    list  print derived unit definitions    test  run the self-test

Values are a number optionally followed by a unit, e.g. \"32.2 ft/s^2\".
Put `--` before negative values that carry a unit: unitcalc -- \"-20 degC\" ...

Example:
  unitcalc \"32.2 ft/s^2\" \"5 lb\" x --unit=N";

#[derive(Parser)]
#[command(name = "unitcalc")]
#[command(about = "RPN calculator for values with units", long_about = None)]
#[command(after_help = OPERATORS_HELP)]
struct Cli {
    /// Values, operators, stack ops, or one of help, list, test
    #[arg(allow_negative_numbers = true)]
    tokens: Vec<String>,

    /// Convert the results, top of stack first, into these units
    #[arg(long, value_delimiter = ',')]
    unit: Vec<String>,

    /// TOML file with unit definitions and output defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::empty(),
    };
    config.apply(&mut registry::global());

    let tokens = calc::parse_tokens(&cli.tokens)?;
    let command = tokens.iter().find_map(|t| match t {
        Token::Command(cmd) => Some(*cmd),
        _ => None,
    });
    if let Some(cmd) = command {
        return run_command(cmd);
    }
    if tokens.is_empty() {
        return run_command(Command::Help);
    }

    let units = if cli.unit.is_empty() {
        &config.output.units
    } else {
        &cli.unit
    };
    debug!(tokens = tokens.len(), units = ?units, "evaluating");
    let results = calc::evaluate(&tokens, units)?;

    if cli.json || config.output.json {
        println!("{}", calc::format_results_json(&results));
    } else {
        println!("{}", calc::format_results(&results));
    }
    Ok(0)
}

fn run_command(cmd: Command) -> Result<i32, Box<dyn std::error::Error>> {
    match cmd {
        Command::Help => {
            Cli::command().print_long_help()?;
            Ok(0)
        }
        Command::List => {
            let registry = registry::global();
            for (name, spec) in registry.definitions() {
                println!("{} = {}", name, spec);
            }
            Ok(0)
        }
        Command::Test => {
            let mut out = std::io::stdout().lock();
            let passed = calc::run_selftest(&mut out)?;
            Ok(if passed { 0 } else { 1 })
        }
    }
}
