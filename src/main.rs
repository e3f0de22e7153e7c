use clap::Parser;
use requirement_butler::{
    config::{Args, Config},
    logging, run, ForwardError, Outcome, State,
};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match forward(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn forward(args: Args) -> Result<Outcome, ForwardError> {
    let config = Config::try_from(args)?;
    let state = State::new(config)?;

    run(&state).await
}
