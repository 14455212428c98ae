//! Target resolution parsing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when a `"WxH"` token cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("invalid resolution format: {0}")]
    InvalidFormat(String),

    #[error("resolution components must be positive: {0}")]
    NonPositive(String),
}

/// A target output resolution, parsed from a `"WxH"` token.
///
/// Both components are guaranteed positive; a malformed token is rejected
/// before any subprocess is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Aspect ratio as width / height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Suffix used in artifact filenames, e.g. `"1280_720"`.
    pub fn file_suffix(&self) -> String {
        format!("{}_{}", self.width, self.height)
    }

    /// The wire representation of the size, `["W", "H"]`.
    pub fn size_tokens(&self) -> Vec<String> {
        vec![self.width.to_string(), self.height.to_string()]
    }
}

impl FromStr for Resolution {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| ResolutionError::InvalidFormat(s.to_string()))?;

        let width: u32 = w
            .parse()
            .map_err(|_| ResolutionError::InvalidFormat(s.to_string()))?;
        let height: u32 = h
            .parse()
            .map_err(|_| ResolutionError::InvalidFormat(s.to_string()))?;

        if width == 0 || height == 0 {
            return Err(ResolutionError::NonPositive(s.to_string()));
        }

        Ok(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let res: Resolution = "1920x1080".parse().unwrap();
        assert_eq!(res.width, 1920);
        assert_eq!(res.height, 1080);
        assert_eq!(res.to_string(), "1920x1080");
    }

    #[test]
    fn test_aspect_ratio() {
        let res = Resolution::new(1920, 1080);
        assert!((res.aspect_ratio() - 16.0 / 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("1920".parse::<Resolution>().is_err());
        assert!("1920x".parse::<Resolution>().is_err());
        assert!("x1080".parse::<Resolution>().is_err());
        assert!("1920x1080x60".parse::<Resolution>().is_err());
        assert!("-640x480".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_parse_rejects_zero_components() {
        assert_eq!(
            "0x1080".parse::<Resolution>(),
            Err(ResolutionError::NonPositive("0x1080".to_string()))
        );
        assert!("1920x0".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_file_suffix_and_tokens() {
        let res = Resolution::new(1280, 720);
        assert_eq!(res.file_suffix(), "1280_720");
        assert_eq!(res.size_tokens(), vec!["1280", "720"]);
    }
}
