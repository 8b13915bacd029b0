use std::path::PathBuf;
use std::process::ExitCode;

use staunton::config::ViewerConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let result = ViewerConfig::load(explicit.as_deref())
        .map_err(staunton::error::StartupError::from)
        .and_then(staunton::window::run);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
