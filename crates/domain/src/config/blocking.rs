use super::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How administratively blocked queries are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum BlockingMode {
    /// Empty string on the wire; answered like `nxdomain`.
    #[default]
    #[serde(rename = "")]
    Default,
    #[serde(rename = "refused")]
    Refused,
    #[serde(rename = "nxdomain")]
    NxDomain,
    #[serde(rename = "custom_ip")]
    CustomIp,
}

impl BlockingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockingMode::Default => "",
            BlockingMode::Refused => "refused",
            BlockingMode::NxDomain => "nxdomain",
            BlockingMode::CustomIp => "custom_ip",
        }
    }
}

impl FromStr for BlockingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(BlockingMode::Default),
            "refused" => Ok(BlockingMode::Refused),
            "nxdomain" => Ok(BlockingMode::NxDomain),
            "custom_ip" => Ok(BlockingMode::CustomIp),
            _ => Err(ValidationError::InvalidBlockingMode),
        }
    }
}

impl fmt::Display for BlockingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
