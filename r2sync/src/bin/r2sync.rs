use clap::Parser;
use log::error;
use r2sync::args::Args;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let stdout = std::io::stdout();
    if let Err(e) = r2sync::run(&args, &mut stdout.lock()) {
        // stderr regardless of RUST_LOG
        eprintln!("Error: {}", e);
        error!("aborted: {:?}", e);
        std::process::exit(1);
    }
}
