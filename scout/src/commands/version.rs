/// Get the version string for scout and libscout
pub fn get_version_string() -> String {
    format!(
        "scout {}\nlibscout {}",
        env!("CARGO_PKG_VERSION"),
        libscout::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
