use anyhow::bail;
use clap::Parser;
use tracing::error;

use nail_condition_detector::config::{Cli, Command, PredictArgs, ServeArgs};
use nail_condition_detector::report::FileReport;
use nail_condition_detector::server;
use nail_condition_detector::utils::{ort_init, tracing_subscriber_init};
use nail_condition_detector::NailScanner;

fn predict_files(scanner: &NailScanner, args: &PredictArgs) -> anyhow::Result<()> {
    let mut failed = 0;
    for path in &args.images {
        let outcome = std::fs::read(path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| Ok(scanner.scan_bytes(&bytes)?));
        if let Err(err) = &outcome {
            error!(path = %path.display(), "{err:#}");
        }

        let report = FileReport::new(path, outcome);
        if report.is_failure() {
            failed += 1;
        }
        if args.json {
            println!("{}", report.to_json());
        } else {
            println!("{report}");
        }
    }

    if failed > 0 {
        bail!("{failed} of {} images could not be classified", args.images.len());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber_init();
    let cli = Cli::parse();
    let command = match cli.command {
        Some(command) => command,
        None => Command::Serve(ServeArgs::from_env().unwrap_or_else(|err| err.exit())),
    };
    ort_init()?;

    // Nothing is served when the model is unusable
    let scanner = match NailScanner::load(&cli.model.path, &cli.model.load_options()) {
        Ok(scanner) => scanner,
        Err(err) => {
            error!("{err}");
            return Err(err.into());
        }
    };

    match command {
        Command::Serve(args) => {
            tokio::runtime::Runtime::new()?.block_on(server::serve(scanner, &args))
        }
        Command::Predict(args) => predict_files(&scanner, &args),
    }
}
