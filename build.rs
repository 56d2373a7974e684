fn main() {
    // ESP-IDF build environment is only needed for ESP32 targets (Xtensa or RISC-V).
    // Build scripts run on the host, so check the TARGET env var.
    if let Ok(target) = std::env::var("TARGET") {
        if target.ends_with("-espidf") {
            embuild::espidf::sysenv::output();
        }
    }

    // Calibration overrides are read with option_env! at compile time.
    for var in [
        "RANGER_PROFILE",
        "RANGER_RSSI_AT_1M",
        "RANGER_PATH_LOSS_EXPONENT",
        "RANGER_PEER_MAC",
    ] {
        println!("cargo:rerun-if-env-changed={}", var);
    }
}
