fn main() {
    if let Err(err) = crop_price_forecast::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
