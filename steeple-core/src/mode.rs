//! Runtime mode configuration for Steeple.

use serde::{Deserialize, Serialize};

/// Runtime mode for Steeple services.
///
/// Production talks to the remote data backend; development serves a
/// seeded in-memory directory so the API can be exercised offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RuntimeMode {
    /// Production mode - queries the remote data backend
    Production,
    /// Development mode - answers from the in-memory demo directory
    #[default]
    Development,
}

impl RuntimeMode {
    /// Check if running in development mode.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if running in production mode.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
        }
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(format!(
                "Invalid runtime mode: '{s}'. Valid options are: production, development"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_display() {
        for mode in [RuntimeMode::Production, RuntimeMode::Development] {
            assert_eq!(mode.to_string().parse::<RuntimeMode>().unwrap(), mode);
        }
        assert!("staging".parse::<RuntimeMode>().is_err());
    }
}
