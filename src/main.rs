fn main() {
    if let Err(e) = screen_recorder_lib::run() {
        eprintln!("Error running screen recorder: {}", e);
        std::process::exit(1);
    }
}
