use cfrotate::configuration::config::Config;
use cfrotate::controller::controller_handler::Controller;
use cfrotate::error_handling::types::ControllerError;
use log::info;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr, stdout only carries the summary.
    // https://docs.rs/env_logger/latest/env_logger/
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_target(false)
        .init();

    let config = Config::from_args();

    let controller = Controller::new(config).unwrap_or_else(|e| {
        println!("Error: {}", e);
        std::process::exit(1);
    });

    info!(
        "Backing up {} into container {}",
        controller.config.path.display(),
        controller.config.container
    );

    match controller.run().await {
        Ok(report) => println!("{}", report),
        Err(ControllerError::Authentication) => {
            println!("Error authenticating with Cloud Files API");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
