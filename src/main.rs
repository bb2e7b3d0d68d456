fn main() {
    if let Err(err) = sankey_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
