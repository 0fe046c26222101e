//! UCI options.

/// Engine options settable over UCI.
#[derive(Debug, Clone)]
pub struct UciOptions {
    /// Transposition table size in MiB.
    pub hash_mb: usize,

    /// Aspiration windows in the iterative-deepening driver.
    pub aspiration: bool,
}

impl Default for UciOptions {
    fn default() -> Self {
        Self {
            hash_mb: 64,
            aspiration: true,
        }
    }
}

impl UciOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `option` declaration lines sent in reply to `uci`.
    pub fn declarations() -> Vec<String> {
        vec![
            "option name Hash type spin default 64 min 1 max 4096".to_string(),
            "option name Aspiration type check default true".to_string(),
        ]
    }

    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), String> {
        match name {
            "Hash" => {
                let v: usize = value
                    .ok_or("Hash needs a value")?
                    .parse()
                    .map_err(|_| format!("bad Hash value {value:?}"))?;
                if !(1..=4096).contains(&v) {
                    return Err("Hash must be between 1 and 4096".to_string());
                }
                self.hash_mb = v;
            }
            "Aspiration" => {
                self.aspiration = matches!(
                    value.unwrap_or("true").to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes"
                );
            }
            _ => return Err(format!("unknown option {name}")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = UciOptions::new();
        assert_eq!(options.hash_mb, 64);
        assert!(options.aspiration);
    }

    #[test]
    fn set_hash_bounds() {
        let mut options = UciOptions::new();
        options.set("Hash", Some("128")).unwrap();
        assert_eq!(options.hash_mb, 128);
        assert!(options.set("Hash", Some("0")).is_err());
        assert!(options.set("Hash", Some("99999")).is_err());
        assert!(options.set("Hash", Some("x")).is_err());
    }

    #[test]
    fn set_aspiration() {
        let mut options = UciOptions::new();
        options.set("Aspiration", Some("false")).unwrap();
        assert!(!options.aspiration);
        options.set("Aspiration", Some("true")).unwrap();
        assert!(options.aspiration);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut options = UciOptions::new();
        assert!(options.set("Ponder", Some("true")).is_err());
    }
}
