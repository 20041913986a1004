//! Build timestamp rendering

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::BundleError;

/// Render format, e.g. `Sat, Oct 17, 2026, 2:39:00 PM EDT`
const STAMP_FORMAT: &str = "%a, %b %-d, %Y, %-I:%M:%S %p %Z";

/// The instant a bundle was built, rendered in a fixed timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStamp {
    at: DateTime<Utc>,
    tz: Tz,
}

impl BuildStamp {
    /// Stamp for the given instant in the named IANA timezone
    pub fn new(at: DateTime<Utc>, timezone: &str) -> Result<Self, BundleError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| BundleError::InvalidTimezone(timezone.to_string()))?;
        Ok(Self { at, tz })
    }

    /// Stamp for the current time
    pub fn now(timezone: &str) -> Result<Self, BundleError> {
        Self::new(Utc::now(), timezone)
    }

    /// Human readable local time
    pub fn render(&self) -> String {
        self.tz.from_utc_datetime(&self.at.naive_utc()).format(STAMP_FORMAT).to_string()
    }

    /// Statement appended to the designated script
    pub fn log_statement(&self) -> String {
        format!("console.log('Built on {}');", self.render())
    }
}
