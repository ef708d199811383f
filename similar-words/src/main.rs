use std::process::ExitCode;

use clap::Parser;
use tokio::io::BufReader;
use wordsim_similar_words::{App, Cli, logging, provider_from_config};

#[tokio::main]
async fn main() -> ExitCode {
    // Values from .env only fill variables that are not already set.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.resolve_config()?;
    let provider = provider_from_config(&config.embedding);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    let app = App::start(&config, provider, &mut stderr).await?;

    let summary = if cli.words.is_empty() {
        eprintln!("Enter a word per line (Ctrl-D to quit):");
        let stdin = BufReader::new(tokio::io::stdin());
        app.answer_lines(stdin, &mut stdout, &mut stderr).await?
    } else {
        app.answer_all(&cli.words, &mut stdout, &mut stderr).await?
    };

    Ok(if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
