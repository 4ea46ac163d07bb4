use std::process;

fn main() {
    pretty_env_logger::init();
    process::exit(chain_prover::client::start());
}
