use chrono::{Local, Utc};

const REGISTRY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current wall-clock time in the host's local zone, as the registry expects it
pub fn now_local() -> String {
    Local::now().format(REGISTRY_TIMESTAMP_FORMAT).to_string()
}

pub fn now_utc() -> String {
    Utc::now().format(REGISTRY_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDateTime;

    #[test]
    fn timestamps_use_registry_format() {
        for stamp in [now_local(), now_utc()] {
            assert_eq!(stamp.len(), 19);
            assert!(NaiveDateTime::parse_from_str(&stamp, REGISTRY_TIMESTAMP_FORMAT).is_ok());
        }
    }
}
