//! Configuration management and validation.
//!
//! Provides the processing configuration: Parquet output settings,
//! normalization switches, validation thresholds and the default
//! butterfly frame. Configuration is read from JSON, either from an
//! explicit path or from the user config directory.

use crate::butterfly::DateDelta;
use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BUTTERFLY_INTERVAL, DEFAULT_BUTTERFLY_LAT_MAX,
    DEFAULT_BUTTERFLY_LAT_MIN, DEFAULT_MAX_INTERVAL_DAYS, DEFAULT_MAX_LATITUDE_SPAN,
    DEFAULT_MAX_LONGITUDE_SPAN, LATITUDE_LIMIT,
};
use crate::error::{Result, SunspotError};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl std::str::FromStr for CompressionAlgorithm {
    type Err = SunspotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(config_error(&format!(
                "unknown compression '{other}' (expected snappy, zstd, lz4 or none)"
            ))),
        }
    }
}

/// Thresholds used by the validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// Longest plausible first-to-last observation span in days
    pub max_interval_days: i64,

    /// Widest plausible latitude extent in degrees
    pub max_latitude_span: i16,

    /// Widest plausible longitude extent in degrees
    pub max_longitude_span: i16,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            max_interval_days: DEFAULT_MAX_INTERVAL_DAYS,
            max_latitude_span: DEFAULT_MAX_LATITUDE_SPAN,
            max_longitude_span: DEFAULT_MAX_LONGITUDE_SPAN,
        }
    }
}

/// Default frame used when building butterfly diagrams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButterflyConfig {
    pub lat_min: i16,
    pub lat_max: i16,

    /// Width of one date bucket
    pub interval: DateDelta,
}

impl Default for ButterflyConfig {
    fn default() -> Self {
        Self {
            lat_min: DEFAULT_BUTTERFLY_LAT_MIN,
            lat_max: DEFAULT_BUTTERFLY_LAT_MAX,
            interval: DEFAULT_BUTTERFLY_INTERVAL
                .parse()
                .unwrap_or(DateDelta::new(0, 1, 0)),
        }
    }
}

/// Global configuration for sunspot processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Compression applied to every Parquet output
    pub compression: CompressionAlgorithm,

    /// Write column statistics into Parquet files
    pub enable_statistics: bool,

    /// Fill missing last-seen dates with the end of the report month
    pub complement_last_seen: bool,

    /// Thresholds for the validation rules
    pub validation: ValidationThresholds,

    /// Butterfly diagram defaults
    pub butterfly: ButterflyConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            compression: CompressionAlgorithm::Snappy,
            enable_statistics: true,
            complement_last_seen: false,
            validation: ValidationThresholds::default(),
            butterfly: ButterflyConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Default config location under the user config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ProcessorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path, else the user config file when present, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<()> {
        let thresholds = &self.validation;
        if thresholds.max_interval_days < 0 {
            return Err(config_error("max_interval_days must not be negative"));
        }
        if thresholds.max_latitude_span < 0 || thresholds.max_longitude_span < 0 {
            return Err(config_error("coordinate span limits must not be negative"));
        }

        let butterfly = &self.butterfly;
        if butterfly.lat_min > butterfly.lat_max {
            return Err(config_error(&format!(
                "butterfly lat_min {} exceeds lat_max {}",
                butterfly.lat_min, butterfly.lat_max
            )));
        }
        if butterfly.lat_min < -LATITUDE_LIMIT || butterfly.lat_max > LATITUDE_LIMIT {
            return Err(config_error("butterfly latitude axis must lie within [-90, 90]"));
        }
        if butterfly.interval.is_zero() {
            return Err(config_error("butterfly interval must be non-zero"));
        }

        Ok(())
    }

    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Enable filling of missing last-seen dates
    pub fn with_complement_last_seen(mut self) -> Self {
        self.complement_last_seen = true;
        self
    }

    pub fn with_validation(mut self, thresholds: ValidationThresholds) -> Self {
        self.validation = thresholds;
        self
    }

    pub fn with_butterfly(mut self, butterfly: ButterflyConfig) -> Self {
        self.butterfly = butterfly;
        self
    }
}

fn config_error(message: &str) -> SunspotError {
    SunspotError::Configuration {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.compression, CompressionAlgorithm::Snappy);
        assert!(!config.complement_last_seen);
        assert_eq!(config.validation.max_interval_days, 62);
        assert_eq!(config.validation.max_latitude_span, 20);
        assert_eq!(config.validation.max_longitude_span, 30);
        assert_eq!(config.butterfly.lat_min, -50);
        assert_eq!(config.butterfly.lat_max, 50);
        assert_eq!(config.butterfly.interval, DateDelta::new(0, 1, 0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_compression_names() {
        assert_eq!("zstd".parse::<CompressionAlgorithm>().unwrap(), CompressionAlgorithm::Zstd);
        assert_eq!(
            "none".parse::<CompressionAlgorithm>().unwrap(),
            CompressionAlgorithm::Uncompressed
        );
        assert!("gzip".parse::<CompressionAlgorithm>().is_err());
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"compression": "Zstd", "butterfly": {{"interval": "P7D"}}}}"#
        )
        .unwrap();

        let config = ProcessorConfig::load(file.path()).unwrap();
        assert_eq!(config.compression, CompressionAlgorithm::Zstd);
        assert_eq!(config.butterfly.interval, DateDelta::new(0, 0, 7));
        assert_eq!(config.butterfly.lat_max, 50);
        assert_eq!(config.validation, ValidationThresholds::default());
    }

    #[test]
    fn test_validate_rejects_inverted_axis() {
        let config = ProcessorConfig::default().with_butterfly(ButterflyConfig {
            lat_min: 10,
            lat_max: -10,
            ..ButterflyConfig::default()
        });
        assert!(matches!(
            config.validate(),
            Err(SunspotError::Configuration { .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_interval() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"butterfly": {{"interval": "P0D"}}}}"#).unwrap();
        assert!(ProcessorConfig::load(file.path()).is_err());
    }
}
