use clap::Parser;

mod cli;
pub mod exit_codes;

use cli::args::Cli;

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    let cli = Cli::parse();
    let code = match cli::pipeline::run(&cli) {
        Ok(_) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::from_error(&e)
        }
    };
    std::process::exit(code);
}
