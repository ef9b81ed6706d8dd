// src/main.rs

use torchbear::event::Status;
use torchbear::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(Status::Succeeded) => {}
        Ok(status) => {
            eprintln!("torchbear: target finished with status {status}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("torchbear error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<Status> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}
