use std::collections::HashMap;
use std::fs;

/// INI-style configuration: bare `key = value` globals plus `[section]` tables.
///
/// Used by both binaries for link defaults (serial port, receive timeouts,
/// transfer gap) and logging destinations.
#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Error reading file {path}: {e}"))?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = &line[1..line.len() - 1];
                current_section = Some(name.to_string());
                continue;
            }

            if let Some(pos) = line.find('=') {
                let key = line[..pos].trim().to_string();
                let value = line[pos + 1..].trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    /// Parses a numeric value; unparsable or missing keys fall back to `default`.
    #[must_use]
    pub fn get_u64_or(&self, section: &str, key: &str, default: u64) -> u64 {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Parses a float value (e.g. gap/timeout seconds); falls back to `default`.
    #[must_use]
    pub fn get_f64_or(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_globals_and_sections() {
        let cfg = Config::parse(
            "port = /dev/ttyUSB0\n\
             # comment\n\
             [station]\n\
             transfer_gap_secs = 1.0\n\
             image_output = \"reconstructed.png\"\n",
        );
        assert_eq!(cfg.get_global("port"), Some("/dev/ttyUSB0"));
        assert_eq!(cfg.get("station", "image_output"), Some("reconstructed.png"));
        assert_eq!(cfg.get("station", "missing"), None);
    }

    #[test]
    fn numeric_getters_fall_back() {
        let cfg = Config::parse("[link]\nreceive_timeout_ms = 2000\nbad = abc\n");
        assert_eq!(cfg.get_u64_or("link", "receive_timeout_ms", 500), 2000);
        assert_eq!(cfg.get_u64_or("link", "bad", 7), 7);
        assert_eq!(cfg.get_u64_or("link", "missing", 9), 9);
        let gap = cfg.get_f64_or("link", "gap", 1.0);
        assert!((gap - 1.0).abs() < f64::EPSILON);
    }
}
