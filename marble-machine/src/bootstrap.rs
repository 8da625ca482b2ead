use std::path::PathBuf;

/// Determine the data directory for the application.
/// Priority: MARBLE_DATA_DIR env var > ~/.marble-machine
pub fn data_dir() -> PathBuf {
    data_dir_with(|key| std::env::var(key).ok())
}

/// [`data_dir`] with an explicit environment lookup.
pub fn data_dir_with<F>(env: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = env("MARBLE_DATA_DIR").filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marble-machine")
}

/// Load the first .env found among the candidate paths and return it.
pub fn load_dotenv() -> Option<&'static str> {
    let candidates = [".env", "../.env"];
    candidates
        .into_iter()
        .find(|path| dotenvy::from_filename(path).is_ok())
}
