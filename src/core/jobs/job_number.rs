use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

// MA-0000, MA-0000-UPPER, MA-0000-LH, MA-0000-LOWER-RH, MA-0000-1, MA-0000-UPPER-RH-1
static JOB_NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<base>MA-(?P<number>\d{4}))(?:-(?P<side>UPPER|LOWER))?(?:-(?P<hand>RH|LH))?(?:-(?P<revision>\d))?",
    )
    .expect("job number pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Right,
    Left,
}

/// A drawing/job number such as `MA-1234-UPPER-RH-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNumber {
    full: String,
    base: String,
    pub side: Option<Side>,
    pub hand: Option<Hand>,
    pub revision: Option<u8>,
}

impl JobNumber {
    /// Finds a job number anywhere in `raw` (file names, sheet titles, ...).
    ///
    /// Spaces are dropped and underscores read as hyphens before matching.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '_' { '-' } else { c })
            .collect();

        let caps = JOB_NUMBER_PATTERN.captures(&normalized)?;
        Some(Self {
            full: caps[0].to_string(),
            base: caps["base"].to_string(),
            side: caps.name("side").map(|m| match m.as_str() {
                "UPPER" => Side::Upper,
                _ => Side::Lower,
            }),
            hand: caps.name("hand").map(|m| match m.as_str() {
                "RH" => Hand::Right,
                _ => Hand::Left,
            }),
            revision: caps.name("revision").and_then(|m| m.as_str().parse().ok()),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The group number without variant suffixes, e.g. `MA-1234`.
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for JobNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}
