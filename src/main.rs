use std::process;

fn main() {
    process::exit(cmdkit::cli::run());
}
