//! Latitude-time occupancy images (butterfly diagrams).
//!
//! A [`ButterflyInfo`] fixes the latitude axis and the date buckets. Each
//! image column is one bucket, each row one half-degree step of latitude
//! with north on top: row `i` is latitude `lat_max - i/2`, so even rows are
//! whole degrees and odd rows the spacers between them.

use crate::error::{Result, SunspotError};
use crate::models::{CoordinateRange, GroupObservation};
use chrono::{Days, Months, NaiveDate};
use ndarray::{Array1, Array2, Axis};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

/// Calendar step of years, months and days, written as an ISO-8601 duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateDelta {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl DateDelta {
    pub const fn new(years: u32, months: u32, days: u32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    /// Date `steps` deltas after `start`; `None` past the end of the calendar
    pub fn advance(&self, start: NaiveDate, steps: u32) -> Option<NaiveDate> {
        let months = self
            .years
            .checked_mul(12)?
            .checked_add(self.months)?
            .checked_mul(steps)?;
        let days = u64::from(self.days) * u64::from(steps);
        start
            .checked_add_months(Months::new(months))?
            .checked_add_days(Days::new(days))
    }
}

impl fmt::Display for DateDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 || self.is_zero() {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}

static ISO_DURATION: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?$"));

fn iso_duration_pattern() -> Result<&'static Regex> {
    Ok(ISO_DURATION.as_ref().map_err(Clone::clone)?)
}

impl FromStr for DateDelta {
    type Err = SunspotError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| SunspotError::InvalidDateDelta {
            text: s.to_string(),
            reason: reason.to_string(),
        };

        let caps = iso_duration_pattern()?
            .captures(s.trim())
            .ok_or_else(|| invalid("expected PnYnMnD"))?;

        let part = |index: usize| -> Result<u32> {
            match caps.get(index) {
                Some(m) => m.as_str().parse().map_err(|_| invalid("component too large")),
                None => Ok(0),
            }
        };
        let delta = DateDelta::new(part(1)?, part(2)?, part(3)?);

        if delta.is_zero() {
            return Err(invalid("at least one component must be non-zero"));
        }
        Ok(delta)
    }
}

impl TryFrom<String> for DateDelta {
    type Error = SunspotError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DateDelta> for String {
    fn from(delta: DateDelta) -> Self {
        delta.to_string()
    }
}

/// Immutable frame of a butterfly image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawButterflyInfo")]
pub struct ButterflyInfo {
    lat_min: i16,
    lat_max: i16,
    date_start: NaiveDate,
    date_end: NaiveDate,
    date_interval: DateDelta,
}

#[derive(Deserialize)]
struct RawButterflyInfo {
    lat_min: i16,
    lat_max: i16,
    date_start: NaiveDate,
    date_end: NaiveDate,
    date_interval: DateDelta,
}

impl TryFrom<RawButterflyInfo> for ButterflyInfo {
    type Error = SunspotError;

    fn try_from(raw: RawButterflyInfo) -> Result<Self> {
        ButterflyInfo::new(
            raw.lat_min,
            raw.lat_max,
            raw.date_start,
            raw.date_end,
            raw.date_interval,
        )
    }
}

impl ButterflyInfo {
    pub fn new(
        lat_min: i16,
        lat_max: i16,
        date_start: NaiveDate,
        date_end: NaiveDate,
        date_interval: DateDelta,
    ) -> Result<Self> {
        let invalid = |reason: String| SunspotError::InvalidButterflyInfo { reason };

        if lat_min > lat_max {
            return Err(invalid(format!("lat_min {lat_min} exceeds lat_max {lat_max}")));
        }
        if date_start > date_end {
            return Err(invalid(format!(
                "date_start {date_start} is after date_end {date_end}"
            )));
        }
        if date_interval.is_zero() {
            return Err(invalid("date_interval must be non-zero".to_string()));
        }

        Ok(Self {
            lat_min,
            lat_max,
            date_start,
            date_end,
            date_interval,
        })
    }

    pub fn lat_min(&self) -> i16 {
        self.lat_min
    }

    pub fn lat_max(&self) -> i16 {
        self.lat_max
    }

    pub fn date_start(&self) -> NaiveDate {
        self.date_start
    }

    pub fn date_end(&self) -> NaiveDate {
        self.date_end
    }

    pub fn date_interval(&self) -> DateDelta {
        self.date_interval
    }

    /// Number of latitude cells, spacers included
    pub fn height(&self) -> usize {
        line_length(self.lat_min, self.lat_max)
    }

    /// Latitude of a row
    pub fn latitude_at(&self, row: usize) -> f64 {
        f64::from(self.lat_max) - row as f64 / 2.0
    }

    /// Start date of every bucket, in order
    pub fn bucket_starts(&self) -> Vec<NaiveDate> {
        let mut starts = Vec::new();
        let mut step = 0u32;
        while let Some(start) = self.date_interval.advance(self.date_start, step) {
            if start > self.date_end {
                break;
            }
            starts.push(start);
            step += 1;
        }
        starts
    }

    /// Inclusive date range of every bucket
    pub fn buckets(&self) -> Vec<(NaiveDate, NaiveDate)> {
        let starts = self.bucket_starts();
        starts
            .iter()
            .enumerate()
            .map(|(index, &start)| {
                let next = self.date_interval.advance(self.date_start, index as u32 + 1);
                let end = next.and_then(|next| next.pred_opt()).unwrap_or(NaiveDate::MAX);
                (start, end)
            })
            .collect()
    }

    /// Number of date buckets
    pub fn width(&self) -> usize {
        self.bucket_starts().len()
    }
}

fn line_length(lat_min: i16, lat_max: i16) -> usize {
    2 * (i32::from(lat_max) - i32::from(lat_min)) as usize + 1
}

/// Occupancy vector of latitude intervals on the axis `[lat_min, lat_max]`.
///
/// Intervals are clipped to the axis; those entirely outside are ignored.
pub fn butterfly_line(intervals: &[CoordinateRange], lat_min: i16, lat_max: i16) -> Array1<u32> {
    if lat_min > lat_max {
        return Array1::zeros(0);
    }
    let mut line = Array1::<u32>::zeros(line_length(lat_min, lat_max));

    for interval in intervals {
        if interval.max < lat_min || interval.min > lat_max {
            continue;
        }
        let low = interval.min.max(lat_min);
        let high = interval.max.min(lat_max);
        let top = 2 * (i32::from(lat_max) - i32::from(high)) as usize;
        let bottom = 2 * (i32::from(lat_max) - i32::from(low)) as usize;
        for cell in line.slice_mut(ndarray::s![top..=bottom]).iter_mut() {
            *cell = 1;
        }
    }
    line
}

/// Occupancy image with its frame
#[derive(Debug, Clone, PartialEq)]
pub struct ButterflyImage {
    pub info: ButterflyInfo,
    /// Rows are latitude cells, columns are date buckets
    pub data: Array2<u32>,
}

impl ButterflyImage {
    /// Build the image of a set of groups; groups without a first-seen date are skipped
    pub fn build(info: ButterflyInfo, observations: &[GroupObservation]) -> Self {
        let buckets = info.buckets();
        let mut data = Array2::<u32>::zeros((info.height(), buckets.len()));

        // Bucket ends ascend, so each group only visits the buckets it overlaps
        let mut columns: Vec<Vec<CoordinateRange>> = vec![Vec::new(); buckets.len()];
        for obs in observations {
            let (Some(first), Some(latitude)) = (obs.first_seen, obs.latitude) else {
                continue;
            };
            let last = obs.last_seen.unwrap_or(first);
            let from = buckets.partition_point(|&(_, end)| end < first);
            for (column, &(start, _)) in buckets.iter().enumerate().skip(from) {
                if start > last {
                    break;
                }
                columns[column].push(latitude);
            }
        }

        for (column, intervals) in columns.iter().enumerate() {
            let line = butterfly_line(intervals, info.lat_min, info.lat_max);
            data.column_mut(column).assign(&line);
        }

        debug!(
            "Built butterfly image {}x{} from {} groups",
            data.nrows(),
            data.ncols(),
            observations.len()
        );
        Self { info, data }
    }

    /// Number of occupied cells
    pub fn occupied(&self) -> usize {
        self.data.iter().filter(|&&cell| cell != 0).count()
    }

    /// Occupancy of one date bucket
    pub fn column(&self, index: usize) -> Array1<u32> {
        self.data.index_axis(Axis(1), index).to_owned()
    }
}

/// Combine images of identical frames; image `k` contributes bit `k`
pub fn merge_images(images: &[ButterflyImage]) -> Result<ButterflyImage> {
    let first = images.first().ok_or_else(|| SunspotError::ImageMismatch {
        reason: "no images to merge".to_string(),
    })?;
    if images.len() > 32 {
        return Err(SunspotError::ImageMismatch {
            reason: format!("cannot combine {} images into 32-bit cells", images.len()),
        });
    }

    let mut data = Array2::<u32>::zeros(first.data.raw_dim());
    for (k, image) in images.iter().enumerate() {
        if image.info != first.info {
            return Err(SunspotError::ImageMismatch {
                reason: format!("image {k} has a different frame"),
            });
        }
        data.zip_mut_with(&image.data, |merged, &cell| *merged |= cell << k);
    }

    Ok(ButterflyImage {
        info: first.info.clone(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Era, ReportMonth};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_duration_pattern_compiled_once() {
        let first = iso_duration_pattern().unwrap();
        let second = iso_duration_pattern().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_date_delta_iso_text() {
        assert_eq!(DateDelta::new(1, 2, 3).to_string(), "P1Y2M3D");
        assert_eq!(DateDelta::new(0, 1, 0).to_string(), "P1M");
        assert_eq!("P10D".parse::<DateDelta>().unwrap(), DateDelta::new(0, 0, 10));
        assert_eq!("P2Y".parse::<DateDelta>().unwrap(), DateDelta::new(2, 0, 0));
        assert!("P0D".parse::<DateDelta>().is_err());
        assert!("P".parse::<DateDelta>().is_err());
        assert!("1M".parse::<DateDelta>().is_err());
        assert!("P-1M".parse::<DateDelta>().is_err());
    }

    #[test]
    fn test_date_delta_text_round_trip() {
        for delta in [
            DateDelta::new(1, 2, 3),
            DateDelta::new(0, 0, 27),
            DateDelta::new(0, 13, 0),
            DateDelta::new(4, 0, 1),
        ] {
            assert_eq!(delta.to_string().parse::<DateDelta>().unwrap(), delta);
        }
    }

    #[test]
    fn test_info_validation() {
        let month = DateDelta::new(0, 1, 0);
        assert!(ButterflyInfo::new(10, -10, ymd(2000, 1, 1), ymd(2000, 12, 1), month).is_err());
        assert!(ButterflyInfo::new(-10, 10, ymd(2001, 1, 1), ymd(2000, 12, 1), month).is_err());
        assert!(ButterflyInfo::new(0, 0, ymd(2000, 1, 1), ymd(2000, 1, 1), month).is_ok());
    }

    #[test]
    fn test_info_json_round_trip() {
        let info = ButterflyInfo::new(-50, 50, ymd(1990, 1, 1), ymd(1999, 12, 1), DateDelta::new(1, 2, 3)).unwrap();
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"date_interval\":\"P1Y2M3D\""));
        let parsed: ButterflyInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);

        let inverted = json.replace("\"lat_min\":-50", "\"lat_min\":60");
        assert!(serde_json::from_str::<ButterflyInfo>(&inverted).is_err());
    }

    #[test]
    fn test_line_orientation_and_fill() {
        let line = butterfly_line(&[CoordinateRange::new(1, 2)], -2, 2);
        assert_eq!(line.len(), 9);
        // rows: 2, 1.5, 1, 0.5, 0, -0.5, -1, -1.5, -2
        assert_eq!(line.to_vec(), vec![1, 1, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_line_point_and_clipping() {
        let line = butterfly_line(
            &[CoordinateRange::point(-1), CoordinateRange::new(-10, -2), CoordinateRange::new(5, 9)],
            -2,
            2,
        );
        assert_eq!(line.to_vec(), vec![0, 0, 0, 0, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_monthly_buckets() {
        let info = ButterflyInfo::new(-1, 1, ymd(2000, 1, 1), ymd(2000, 3, 1), DateDelta::new(0, 1, 0)).unwrap();
        assert_eq!(
            info.buckets(),
            vec![
                (ymd(2000, 1, 1), ymd(2000, 1, 31)),
                (ymd(2000, 2, 1), ymd(2000, 2, 29)),
                (ymd(2000, 3, 1), ymd(2000, 3, 31)),
            ]
        );
        assert_eq!(info.height(), 5);
    }

    #[test]
    fn test_image_uses_interval_overlap() {
        let info = ButterflyInfo::new(-2, 2, ymd(2000, 1, 1), ymd(2000, 3, 1), DateDelta::new(0, 1, 0)).unwrap();
        let mut obs = GroupObservation::empty(Era::New, ReportMonth::new(2000, 1));
        obs.latitude = Some(CoordinateRange::point(2));
        obs.first_seen = Some(ymd(2000, 1, 30));
        obs.last_seen = Some(ymd(2000, 2, 2));

        let image = ButterflyImage::build(info, &[obs]);
        assert_eq!(image.data.dim(), (9, 3));
        assert_eq!(image.column(0)[0], 1);
        assert_eq!(image.column(1)[0], 1);
        assert_eq!(image.column(2)[0], 0);
        assert_eq!(image.occupied(), 2);
    }

    #[test]
    fn test_image_matches_overlap_scan_on_daily_buckets() {
        let info = ButterflyInfo::new(-30, 30, ymd(1990, 1, 1), ymd(1992, 12, 31), DateDelta::new(0, 0, 1)).unwrap();
        let spans = [
            (ymd(1989, 12, 20), Some(ymd(1990, 1, 3)), (10, 14)),
            (ymd(1990, 6, 1), None, (-8, -8)),
            (ymd(1991, 3, 10), Some(ymd(1991, 3, 2)), (5, 7)),
            (ymd(1992, 12, 25), Some(ymd(1993, 1, 9)), (-25, -20)),
            (ymd(1993, 2, 1), Some(ymd(1993, 2, 3)), (1, 1)),
        ];
        let groups: Vec<GroupObservation> = spans
            .iter()
            .map(|&(first, last, (a, b))| {
                let mut obs = GroupObservation::empty(Era::New, ReportMonth::from_date(first));
                obs.first_seen = Some(first);
                obs.last_seen = last;
                obs.latitude = Some(CoordinateRange::new(a, b));
                obs
            })
            .collect();

        let image = ButterflyImage::build(info.clone(), &groups);
        for (column, &(start, end)) in info.buckets().iter().enumerate() {
            let intervals: Vec<CoordinateRange> = groups
                .iter()
                .filter(|obs| obs.overlaps(start, end))
                .filter_map(|obs| obs.latitude)
                .collect();
            assert_eq!(image.column(column), butterfly_line(&intervals, -30, 30), "bucket {start}");
        }
        assert!(image.occupied() > 0);
    }

    #[test]
    fn test_merge_shifts_each_image() {
        let info = ButterflyInfo::new(0, 1, ymd(2000, 1, 1), ymd(2000, 1, 1), DateDelta::new(0, 1, 0)).unwrap();
        let a = ButterflyImage {
            info: info.clone(),
            data: Array2::from_shape_vec((3, 1), vec![1, 0, 1]).unwrap(),
        };
        let b = ButterflyImage {
            info: info.clone(),
            data: Array2::from_shape_vec((3, 1), vec![1, 1, 0]).unwrap(),
        };

        let merged = merge_images(&[a, b]).unwrap();
        assert_eq!(merged.data.column(0).to_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn test_merge_requires_identical_frames() {
        let monthly = ButterflyInfo::new(0, 1, ymd(2000, 1, 1), ymd(2000, 1, 1), DateDelta::new(0, 1, 0)).unwrap();
        let weekly = ButterflyInfo::new(0, 1, ymd(2000, 1, 1), ymd(2000, 1, 1), DateDelta::new(0, 0, 7)).unwrap();
        let a = ButterflyImage::build(monthly, &[]);
        let b = ButterflyImage::build(weekly, &[]);
        assert!(matches!(merge_images(&[a, b]), Err(SunspotError::ImageMismatch { .. })));
    }
}
