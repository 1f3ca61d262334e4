// src/main.rs

use devstack::{cli, logging, run};

// One supervisory thread; all concurrency comes from the child processes.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("devstack error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        eprintln!("devstack error: {err}");
        std::process::exit(err.exit_code());
    }
}
