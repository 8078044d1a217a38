fn main() {
    if let Err(err) = football_etl::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
