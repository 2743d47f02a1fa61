use crate::result::Result;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year].[month].[day].[hour repr:24][minute][second]");

const TIME_PATTERN: &str = r"(\d{4}\.\d{2}\.\d{2}\.\d{6})";

/// Seconds since the Unix epoch, validated to be a representable date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_unix(seconds: i64) -> Result<Self> {
        OffsetDateTime::from_unix_timestamp(seconds)?;
        Ok(Timestamp(seconds))
    }

    pub fn now() -> Self {
        Timestamp(OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn as_unix(&self) -> i64 {
        self.0
    }

    /// Render as `YYYY.MM.DD.HHMMSS`, UTC on a 24-hour clock
    pub fn formatted(&self) -> String {
        // Range was checked on construction, so neither step can fail.
        OffsetDateTime::from_unix_timestamp(self.0)
            .ok()
            .and_then(|dt| dt.format(TIME_FORMAT).ok())
            .unwrap_or_default()
    }

    /// Recover the timestamp embedded in an archive or deploy name
    pub fn from_name(name: &str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(TIME_PATTERN).expect("time pattern is valid"));

        let stamp = re.captures(name)?.get(1)?.as_str();
        let datetime = PrimitiveDateTime::parse(stamp, TIME_FORMAT).ok()?;
        Some(Timestamp(datetime.assume_utc().unix_timestamp()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

/// `source_<stamp>.zip`
pub fn archive_name(timestamp: Timestamp) -> String {
    format!("source_{}.zip", timestamp.formatted())
}

/// `deploy_<stamp>`
pub fn deploy_name(timestamp: Timestamp) -> String {
    format!("deploy_{}", timestamp.formatted())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMESTAMP: i64 = 1518044860;

    #[test]
    fn test_archive_name() {
        let ts = Timestamp::from_unix(TIMESTAMP).unwrap();
        assert_eq!(archive_name(ts), "source_2018.02.07.230740.zip");
    }

    #[test]
    fn test_deploy_name() {
        let ts = Timestamp::from_unix(TIMESTAMP).unwrap();
        assert_eq!(deploy_name(ts), "deploy_2018.02.07.230740");
    }

    #[test]
    fn test_names_are_deterministic() {
        let ts = Timestamp::from_unix(TIMESTAMP).unwrap();
        assert_eq!(archive_name(ts), archive_name(ts));
        assert_eq!(deploy_name(ts), deploy_name(ts));
    }

    #[test]
    fn test_hours_are_zero_padded_24h() {
        // 2018-02-08 02:47:40 UTC
        let early = Timestamp::from_unix(1518058060).unwrap();
        assert_eq!(early.formatted(), "2018.02.08.024740");

        // 2018-02-08 14:00:05 UTC
        let late = Timestamp::from_unix(1518098405).unwrap();
        assert_eq!(late.formatted(), "2018.02.08.140005");
    }

    #[test]
    fn test_epoch() {
        let ts = Timestamp::from_unix(0).unwrap();
        assert_eq!(archive_name(ts), "source_1970.01.01.000000.zip");
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Timestamp::from_unix(i64::MAX).is_err());
    }

    #[test]
    fn test_from_name() {
        let ts = Timestamp::from_unix(TIMESTAMP).unwrap();
        assert_eq!(Timestamp::from_name(&archive_name(ts)), Some(ts));
        assert_eq!(
            Timestamp::from_name(&deploy_name(ts)).map(|t| t.as_unix()),
            Some(TIMESTAMP)
        );
        assert_eq!(
            Timestamp::from_name("/srv/builds/source_2018.02.07.230740.zip"),
            Some(ts)
        );
        assert_eq!(Timestamp::from_name("release.zip"), None);
        assert_eq!(Timestamp::from_name("source_2018.13.45.990000.zip"), None);
    }
}
