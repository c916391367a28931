// Build with `cargo run --features binaries --bin trip_insights -- [OPTIONS] [QUESTION]`

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use trip_insights::catalog;
use trip_insights::dataset::TripTable;
use trip_insights::recipes;
use trip_insights::settings::{Settings, DATA_PATH_VAR};

#[derive(Parser)]
#[command(
    name = "trip_insights",
    version,
    about = "Answer canned analysis questions about a ride-sharing trip dataset",
    long_about = "Without a question, lists the numbered catalog. A question can be given\n\
                  by its label, its longer title, or its number in the list."
)]
struct Args {
    /// Dataset to load (.csv, .tsv, .txt or .parquet)
    #[arg(long, env = DATA_PATH_VAR)]
    data: Option<PathBuf>,
    /// Answer every question in the catalog
    #[arg(long, conflicts_with = "question")]
    all: bool,
    /// Question label, title or number
    question: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.question.is_none() && !args.all {
        for question in catalog::questions() {
            println!("{:>2}. {}", question.number, question.label);
        }
        return Ok(());
    }

    let mut settings = Settings::from_env()?;
    if let Some(path) = args.data {
        settings = settings.with_data_path(path);
    }
    let table = TripTable::load(&settings).await?;

    if args.all {
        for (question, answer) in recipes::run_all(&table).await? {
            println!("== Analysis: {}", question.title);
            println!("{}", answer);
        }
    } else if let Some(query) = args.question {
        let question = catalog::find(&query)?;
        let answer = recipes::answer(question, &table).await?;
        println!("== Analysis: {}", question.title);
        print!("{}", answer);
    }
    Ok(())
}
