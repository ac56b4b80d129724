//! Application constants for the sunspot processor
//!
//! Era boundaries, sentinel tokens, output file names and default
//! thresholds used throughout the pipeline.

// =============================================================================
// Recording Era Boundaries
// =============================================================================

/// Recording-format era boundaries as inclusive (year, month) pairs.
///
/// These follow the dates on which the transcription format actually changed
/// and must not be rounded to calendar years.
pub mod era_bounds {
    /// First month transcribed from the handwritten notebooks
    pub const NOTEBOOK_START: (i32, u32) = (1953, 1);
    /// Last notebook month before the tabulated "old" reports
    pub const NOTEBOOK_END: (i32, u32) = (1964, 3);

    /// First month of the "old" tabulated report format
    pub const OLD_START: (i32, u32) = (1964, 4);
    /// Last month of the "old" report format
    pub const OLD_END: (i32, u32) = (1978, 12);

    /// First month of the "new" report format
    pub const NEW_START: (i32, u32) = (1979, 1);
    /// Last month covered by the archive
    pub const NEW_END: (i32, u32) = (2016, 12);
}

// =============================================================================
// Sentinel Tokens
// =============================================================================

/// Tokens with special meaning in the raw transcriptions
pub mod sentinels {
    /// "Not detected": the observer looked but could not measure the value
    pub const NOT_DETECTED: &str = "ND";

    /// Marks a fragment whose coordinates live in the adjacent monthly report
    pub const CONTINUATION: &str = "/";

    /// Trailing marker for a value the observer doubted
    pub const UNCERTAIN: char = '?';

    /// Separator between the two ends of a coordinate range
    pub const RANGE_SEPARATOR: char = '~';

    /// Comment prefix in raw files
    pub const COMMENT_PREFIX: char = '#';
}

/// English month abbreviations used by the "old" reports, January first
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

// =============================================================================
// Coordinate Bounds
// =============================================================================

/// Heliographic latitude magnitude limit in degrees
pub const LATITUDE_LIMIT: i16 = 90;

/// Central-meridian distance bounds (E/W notation) in degrees
pub const CMD_LONGITUDE_BOUNDS: (i16, i16) = (-180, 180);

/// Carrington longitude bounds in degrees
pub const CARRINGTON_LONGITUDE_BOUNDS: (i16, i16) = (0, 360);

// =============================================================================
// Output Files
// =============================================================================

/// Canonical active-region table
pub const ACTIVE_REGIONS_FILE: &str = "active_regions.parquet";

/// Canonical per-group daily rows of the sunspot-count dataset
pub const DAILY_GROUPS_FILE: &str = "daily_groups.parquet";

/// Daily relative sunspot numbers
pub const DAILY_NUMBERS_FILE: &str = "sunspot_number_daily.parquet";

/// Monthly mean relative sunspot numbers
pub const MONTHLY_NUMBERS_FILE: &str = "sunspot_number_monthly.parquet";

/// Butterfly occupancy matrix
pub const BUTTERFLY_MATRIX_FILE: &str = "butterfly.csv";

/// Butterfly frame metadata
pub const BUTTERFLY_INFO_FILE: &str = "butterfly.json";

/// Config file name under the user config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Application directory name under the user config directory
pub const APP_DIR_NAME: &str = "sunspot-processor";

// =============================================================================
// Default Thresholds
// =============================================================================

/// Longest plausible first-to-last observation span, in days
pub const DEFAULT_MAX_INTERVAL_DAYS: i64 = 62;

/// Widest plausible latitude extent of one group, in degrees
pub const DEFAULT_MAX_LATITUDE_SPAN: i16 = 20;

/// Widest plausible longitude extent of one group, in degrees
pub const DEFAULT_MAX_LONGITUDE_SPAN: i16 = 30;

/// Default butterfly latitude axis
pub const DEFAULT_BUTTERFLY_LAT_MIN: i16 = -50;
pub const DEFAULT_BUTTERFLY_LAT_MAX: i16 = 50;

/// Default butterfly date step
pub const DEFAULT_BUTTERFLY_INTERVAL: &str = "P1M";

/// Maximum field issues echoed individually by the CLI
pub const MAX_REPORTED_ISSUES: usize = 20;
