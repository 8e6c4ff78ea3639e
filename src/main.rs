use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match catalog_cache::cli::execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
