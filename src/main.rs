fn main() {
    if let Err(err) = datapkg::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
