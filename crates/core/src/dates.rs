use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

const CREATED_PATTERN: &str = r"Created:\s*([0-9]{4})년\s*([0-9]{1,2})월\s*([0-9]{1,2})일.*?([0-9]{1,2}):([0-9]{2}):([0-9]{2})";

// Characters past the end of the match that are still searched for a
// meridiem marker.
const MARKER_LOOKAHEAD_CHARS: usize = 10;

const ANTE_MERIDIEM: &str = "오전";
const POST_MERIDIEM: &str = "오후";

#[derive(Debug, Clone)]
pub struct CreatedDateParser {
    pattern: Regex,
}

impl CreatedDateParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(CREATED_PATTERN)?,
        })
    }

    pub fn parse(&self, content: &str) -> Option<NaiveDateTime> {
        let captures = self.pattern.captures(content)?;
        let whole = captures.get(0)?;

        let field = |index: usize| -> Option<u32> { captures.get(index)?.as_str().parse().ok() };
        let year = i32::try_from(field(1)?).ok()?;
        let month = field(2)?;
        let day = field(3)?;
        let mut hour = field(4)?;
        let minute = field(5)?;
        let second = field(6)?;

        let window = &content[whole.start()..lookahead_end(content, whole.end())];
        if window.contains(POST_MERIDIEM) && hour < 12 {
            hour += 12;
        } else if window.contains(ANTE_MERIDIEM) && hour == 12 {
            hour = 0;
        }

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }
}

fn lookahead_end(content: &str, match_end: usize) -> usize {
    content[match_end..]
        .char_indices()
        .nth(MARKER_LOOKAHEAD_CHARS)
        .map(|(offset, _)| match_end + offset)
        .unwrap_or(content.len())
}
