fn main() {
    if let Err(err) = geoclip_lib::run() {
        eprintln!("geoclip: {err:#}");
        std::process::exit(1);
    }
}
