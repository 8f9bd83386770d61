use elevatorsim::init::{self, CliCommand};
use elevatorsim::print;


#[tokio::main]
async fn main() {
    let config = match init::parse_args() {
        Ok(CliCommand::Run(config)) => config,
        Ok(CliCommand::Help) => {
            init::print_help();
            return;
        }
        Err(e) => {
            print::err(format!("Invalid arguments: {:#}", e));
            std::process::exit(2);
        }
    };

    print::info("Starting elevator simulation...".to_string());

    match init::start_simulation(config).await {
        Ok(summary) => print::ok(format!("Done: {}", summary)),
        Err(e) => {
            print::err(format!("Simulation failed: {:#}", e));
            std::process::exit(1);
        }
    }
}
