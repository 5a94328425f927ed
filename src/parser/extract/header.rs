use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use tracing::warn;

use crate::error::ParseError;
use crate::parser::rows::Row;
use crate::parser::text::{normalize_whitespace, text_of};

const TABLE: &str = "session description";
const NAME_LABEL: &str = "Bezeichnung:";
/// The back-end publishes local times without an offset; sessions are
/// stamped with central european summer time.
const CEST_SECONDS: i32 = 2 * 3600;

/// Session fields held by the description table at the top of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHeader {
    pub short_name: String,
    pub organization: String,
    pub start: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
    pub place: Place,
}

/// Row 3 either names the session directly or carries the location, in
/// which case the name moves to row 4.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Unlocated { name: String },
    Located { locality: String, name: String },
}

impl Place {
    pub fn name(&self) -> &str {
        match self {
            Place::Unlocated { name } | Place::Located { name, .. } => name,
        }
    }

    pub fn locality(&self) -> Option<&str> {
        match self {
            Place::Unlocated { .. } => None,
            Place::Located { locality, .. } => Some(locality),
        }
    }
}

pub fn extract(rows: &[Row]) -> Result<SessionHeader, ParseError> {
    let short_name = normalize_whitespace(&cell_text(rows, 0, 1)?);
    let organization = normalize_whitespace(&cell_text(rows, 0, 3)?);

    let date = parse_date(&cell_text(rows, 1, 1)?)?;
    let range = cell_text(rows, 1, 3)?;
    let (start, end) = parse_time_range(date, &range)?;

    let place = if cell_text(rows, 2, 0)?.contains(NAME_LABEL) {
        Place::Unlocated {
            name: normalize_whitespace(&cell_text(rows, 2, 1)?),
        }
    } else {
        Place::Located {
            locality: normalize_whitespace(&cell_text(rows, 2, 1)?),
            name: normalize_whitespace(&cell_text(rows, 3, 1)?),
        }
    };

    Ok(SessionHeader {
        short_name,
        organization,
        start,
        end,
        place,
    })
}

fn cell_text(rows: &[Row], row: usize, cell: usize) -> Result<String, ParseError> {
    let cells = rows.get(row).ok_or(ParseError::MissingRow { table: TABLE, row })?;
    let el = cells.get(cell).ok_or(ParseError::MissingCell {
        table: TABLE,
        row,
        cell,
    })?;
    Ok(text_of(*el))
}

/// "13.07.2013" (as rendered) or "2013-07-13".
pub fn parse_date(text: &str) -> Result<NaiveDate, ParseError> {
    let text = normalize_whitespace(text);
    ["%d.%m.%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
        .ok_or(ParseError::InvalidDate(text))
}

/// "17:00", "17:00:30" or "17:00 Uhr". An empty time means midnight.
pub fn parse_time(text: &str) -> Result<NaiveTime, ParseError> {
    let text = normalize_whitespace(text);
    let bare = normalize_whitespace(text.trim_end_matches("Uhr"));
    if bare.is_empty() {
        return Ok(NaiveTime::MIN);
    }
    ["%H:%M:%S", "%H:%M", "%H.%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&bare, fmt).ok())
        .ok_or(ParseError::InvalidTime(text))
}

/// Split "start-end" and stamp both with the session date in CEST. The end
/// is dropped when missing, blank or not after the start.
pub fn parse_time_range(
    date: NaiveDate,
    range: &str,
) -> Result<(DateTime<FixedOffset>, Option<DateTime<FixedOffset>>), ParseError> {
    let mut parts = range.split('-');
    let start = stamp(date, parse_time(parts.next().unwrap_or_default())?, range)?;

    let end = match parts.next().map(normalize_whitespace) {
        Some(end) if !end.is_empty() => Some(stamp(date, parse_time(&end)?, range)?),
        _ => None,
    };
    let end = end.filter(|end| {
        let after = *end > start;
        if !after {
            warn!(range, "session end is not after its start, dropping end time");
        }
        after
    });

    Ok((start, end))
}

fn stamp(date: NaiveDate, time: NaiveTime, raw: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let cest = FixedOffset::east_opt(CEST_SECONDS).ok_or(ParseError::InvalidTime(raw.to_string()))?;
    date.and_time(time)
        .and_local_timezone(cest)
        .single()
        .ok_or(ParseError::InvalidTime(raw.to_string()))
}

// ── Tests ──
