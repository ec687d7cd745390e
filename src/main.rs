use std::process::ExitCode;

mod aws;
mod cli;
mod config;
mod errors;
mod keys;
mod logging;
mod select;
mod ssh;

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(cli::run());

    // The shell bridge leaves one blocking stdin read pending on the pool;
    // dropping the runtime would wait for a keypress to finish it. Release
    // the runtime without waiting instead.
    runtime.shutdown_background();

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn test_shutdown_background_ignores_pending_blocking_work() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(60)));
            tokio::task::yield_now().await;
        });
        // Must return immediately; a plain drop would sit on the sleep.
        runtime.shutdown_background();
    }
}
