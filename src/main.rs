fn main() {
    if let Err(err) = edge_bundler::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
