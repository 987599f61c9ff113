use std::path::PathBuf;

/// Cross-platform data directory.
/// Linux: ~/.config/hindsight/
/// macOS: ~/Library/Application Support/hindsight/
/// Windows: %APPDATA%/hindsight/
pub fn data_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    });
    base.join("hindsight")
}

/// Default durable store location: {data_dir}/scenarios.db
pub fn default_db_path() -> PathBuf {
    data_dir().join("scenarios.db")
}

/// Optional config file: {data_dir}/config.json
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Log file written by `logging::init_file_logging`: {data_dir}/hindsight.log
pub fn log_path() -> PathBuf {
    data_dir().join("hindsight.log")
}
