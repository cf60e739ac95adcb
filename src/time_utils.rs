use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Calendar used to decide which day an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timezone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone::utc()
    }
}

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (sign, rest) = match trimmed.chars().next()? {
        '+' => (1, &trimmed[1..]),
        '-' => (-1, &trimmed[1..]),
        _ => return None,
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else if rest.len() > 2 {
        let (h, m) = rest.split_at(rest.len() - 2);
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn canonical_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("gmt") {
        "UTC".to_string()
    } else if trimmed == "Europe/Kiev" {
        "Europe/Kyiv".to_string()
    } else {
        trimmed.to_string()
    }
}

impl Timezone {
    pub fn utc() -> Self {
        Timezone::Named(chrono_tz::UTC)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        let normalized = canonical_name(raw);

        if normalized == "UTC" {
            return Some(Timezone::utc());
        }

        let upper = normalized.to_uppercase();
        if upper.starts_with("UTC") || upper.starts_with("GMT") {
            let offset = &normalized[3..];
            if offset.is_empty() {
                return Some(Timezone::utc());
            }
            if let Some(parsed) = parse_fixed_offset(offset) {
                return Some(Timezone::Fixed(parsed));
            }
        }

        if let Some(parsed) = parse_fixed_offset(&normalized) {
            return Some(Timezone::Fixed(parsed));
        }

        normalized.parse::<Tz>().ok().map(Timezone::Named)
    }

    /// Calendar day of `utc_dt` in this timezone.
    pub fn local_date(&self, utc_dt: DateTime<Utc>) -> NaiveDate {
        match self {
            Timezone::Named(tz) => utc_dt.with_timezone(tz).date_naive(),
            Timezone::Fixed(offset) => utc_dt.with_timezone(offset).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    /// Instant of a local wall-clock time. Gaps (DST spring-forward) fall back to UTC.
    pub fn at_local(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        let local = match self {
            Timezone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Timezone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        local.unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

pub fn normalize_timezone(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    let normalized = canonical_name(raw);
    Timezone::parse(&normalized).map(|_| normalized)
}
