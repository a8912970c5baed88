use clap::{Parser as ClapParser, Subcommand};
use recipe_filter::cli::{self, CheckOptions, CheckResult, CliError};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "rfilter")]
#[command(about = "rfilter - Evaluate recipe filter expressions and sampling functions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate a filter expression
    Check {
        /// The filter expression to evaluate
        expression: String,

        /// JSON context (reads from stdin if not provided)
        #[arg(short, long)]
        context: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print the 64-digit hex key for a fraction in [0, 1]
    Key {
        fraction: f64,
    },

    /// Run a sampling function against a JSON input
    Sample {
        #[command(subcommand)]
        method: SampleMethod,
    },
}

#[derive(Subcommand)]
enum SampleMethod {
    /// Select roughly RATE of all inputs
    Stable {
        /// JSON value to hash
        input: String,
        rate: f64,
    },

    /// Select inputs hashing into buckets [START, START+COUNT) of TOTAL
    Bucket {
        /// JSON value to hash
        input: String,
        #[arg(long)]
        start: i64,
        #[arg(long)]
        count: i64,
        #[arg(long)]
        total: i64,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            expression,
            context,
            pretty,
            syntax_only,
        } => run_check(expression, context, pretty, syntax_only),
        Commands::Key { fraction } => cli::execute_fraction_to_key(fraction).map(|key| {
            println!("{}", key);
        }),
        Commands::Sample { method } => run_sample(method),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_sample(method: SampleMethod) -> Result<(), CliError> {
    let selected = match method {
        SampleMethod::Stable { input, rate } => cli::execute_stable_sample(&input, rate)?,
        SampleMethod::Bucket {
            input,
            start,
            count,
            total,
        } => cli::execute_bucket_sample(&input, start, count, total)?,
    };
    println!("{}", selected);
    Ok(())
}

fn run_check(
    expression: String,
    context: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let context = match context {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        context,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
