fn main() {
    println!("cargo:rerun-if-env-changed=DRYERMON_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=DRYERMON_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=DRYERMON_HOSTNAME");
    println!("cargo:rerun-if-env-changed=DRYERMON_CONFIG_JSON");

    // Host builds (`--no-default-features`) have no ESP-IDF sysenv to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
