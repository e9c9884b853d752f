fn main() {
    // Emit esp-idf link/search args only when building for the device.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
