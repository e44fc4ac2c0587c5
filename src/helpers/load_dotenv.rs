use std::env;

const DOTENV_PATH: &str = "DOTENV_PATH";

pub fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        eprintln!("Loaded local .env")
    }
    // Also load an explicitly named env file if one is given
    if let Ok(path) = env::var(DOTENV_PATH) {
        if dotenv::from_path(&path).is_ok() {
            eprintln!("Loaded {path}");
        }
    }
}
