use anyhow::Context;
use blackjack_ev::{Calculator, Expectations, HouseRules, StrategyTable};
use blackjack_ev_drivers::{parse_config_from_file, Config};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};

const DEFAULT_CONFIG_FILE_NAME: &str = ".blackjack_ev.yml";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file. Defaults to ~/.blackjack_ev.yml, or the
    /// built-in rules when that file does not exist.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the recursion depth of the config file.
    #[arg(short, long)]
    depth: Option<i32>,

    /// Prints the result as YAML.
    #[arg(long)]
    yaml: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Expected values of one hand against a dealer up card.
    Hand {
        /// Player cards, e.g. `10,6`. Aces are 1.
        #[arg(value_delimiter = ',', required = true)]
        cards: Vec<u8>,

        /// Dealer up card. Aces are 1.
        #[arg(short, long)]
        up: u8,
    },
    /// Best decision of every initial hand against every up card.
    Table,
}

#[derive(Debug, Serialize)]
struct HandReport {
    rules: String,
    recursion_depth: usize,
    cards: Vec<u8>,
    dealer_up_card: u8,
    expected_values: blackjack_ev::ExpectedValues,
    best: Option<blackjack_ev::Decision>,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return parse_config_from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let home_dir = home::home_dir().context("cannot find home directory")?;
    let config_file_path = home_dir.join(DEFAULT_CONFIG_FILE_NAME);
    if !config_file_path.exists() {
        return Ok(Config::default());
    }
    if config_file_path.is_dir() {
        anyhow::bail!(
            "{} should be a file rather than a directory",
            config_file_path.display()
        );
    }
    parse_config_from_file(&config_file_path)
        .with_context(|| format!("failed to load config {}", config_file_path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = CommandLineArgs::parse();
    let config = load_config(args.config)?;

    let level: Level = config
        .calculator
        .log_level
        .parse()
        .with_context(|| format!("invalid log level {}", config.calculator.log_level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let rules: HouseRules = config.rule.try_into().context("invalid rules in config")?;
    let recursion_depth = args.depth.unwrap_or(config.calculator.recursion_depth);
    let calculator = Calculator::new(rules, recursion_depth)?;
    info!(%rules, recursion_depth, "loaded config");

    match args.command {
        Command::Hand { cards, up } => {
            let expected_values = calculator
                .compute_ev(&cards, up)
                .with_context(|| format!("cannot compute {:?} against {}", cards, up))?;
            let report = HandReport {
                rules: rules.to_string(),
                recursion_depth: calculator.depth(),
                best: expected_values.best().map(|(decision, _)| decision),
                cards,
                dealer_up_card: up,
                expected_values,
            };
            if args.yaml {
                print!("{}", serde_yaml::to_string(&report)?);
            } else {
                print_hand_report(&report);
            }
        }
        Command::Table => {
            let table = StrategyTable::compute(&calculator, config.calculator.number_of_threads)?;
            if args.yaml {
                print!("{}", serde_yaml::to_string(&table)?);
            } else {
                print!("{}", table);
            }
        }
    }

    Ok(())
}

fn print_hand_report(report: &HandReport) {
    fn format_ex(ex: Option<f64>) -> String {
        match ex {
            Some(ex) => format!("{:+.6}", ex),
            None => String::from("-"),
        }
    }

    println!("{}, depth {}", report.rules, report.recursion_depth);
    println!("{:?} vs {}", report.cards, report.dealer_up_card);
    let ex = &report.expected_values;
    println!("stand      {}", format_ex(Some(ex.stand)));
    println!("hit        {}", format_ex(ex.hit));
    println!("double     {}", format_ex(ex.double));
    println!("split      {}", format_ex(ex.split));
    println!("surrender  {}", format_ex(ex.surrender));
    println!("insurance  {}", format_ex(ex.insurance));
    if let Some(best) = report.best {
        println!("best       {:?}", best);
    }
}
