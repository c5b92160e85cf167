use camino::{Utf8Path, Utf8PathBuf};
use dirs::home_dir;

pub const DEFAULT_THREADLINE_HOME: &str = ".threadline";

pub fn default_home_dir() -> Utf8PathBuf {
    if let Some(home) = home_dir().as_deref().and_then(Utf8Path::from_path) {
        return home.join(DEFAULT_THREADLINE_HOME);
    }

    Utf8PathBuf::from(DEFAULT_THREADLINE_HOME)
}
