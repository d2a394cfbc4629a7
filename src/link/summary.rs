//! Session counters and the end-of-run report.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::LinkOutcome;

/// Cumulative classification counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCounters {
    pub good: u64,
    pub bad_addr: u64,
    pub bad_data: u64,
    pub bad_garbage: u64,
    /// Every structurally valid packet, whatever its outcome.
    pub total: u64,
}

impl LinkCounters {
    pub(crate) fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Good => self.good += 1,
            LinkOutcome::BadAddress => self.bad_addr += 1,
            LinkOutcome::BadData => self.bad_data += 1,
            LinkOutcome::BadGarbage => self.bad_garbage += 1,
        }
        self.total += 1;
    }

    /// Fraction of packets classified good, 0 when nothing was received.
    pub fn good_ratio(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.good as f64 / self.total as f64 }
    }
}

/// End-of-session report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub counters: LinkCounters,
    /// Packets rejected before classification (bad sync or length).
    pub malformed: u64,
}

impl LinkSummary {
    pub fn good_ratio(&self) -> f64 {
        self.counters.good_ratio()
    }
}

impl fmt::Display for LinkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(f, "Link summary")?;
        writeln!(f, "  good        : {}", c.good)?;
        writeln!(f, "  bad address : {}", c.bad_addr)?;
        writeln!(f, "  bad data    : {}", c.bad_data)?;
        writeln!(f, "  bad garbage : {}", c.bad_garbage)?;
        writeln!(f, "  total       : {}", c.total)?;
        writeln!(f, "  malformed   : {}", self.malformed)?;
        write!(f, "  good ratio  : {:.1}%", self.good_ratio() * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_bumps_outcome_and_total() {
        let mut counters = LinkCounters::default();
        counters.record(LinkOutcome::Good);
        counters.record(LinkOutcome::BadGarbage);
        assert_eq!(
            counters,
            LinkCounters { good: 1, bad_addr: 0, bad_data: 0, bad_garbage: 1, total: 2 }
        );
        assert_eq!(counters.good_ratio(), 0.5);
    }

    #[test]
    fn empty_session_ratio_is_zero() {
        assert_eq!(LinkSummary::default().good_ratio(), 0.0);
    }

    #[test]
    fn report_lists_every_counter() {
        let summary = LinkSummary {
            counters: LinkCounters { good: 3, bad_addr: 1, bad_data: 1, bad_garbage: 0, total: 5 },
            malformed: 2,
        };
        let text = summary.to_string();
        assert!(text.contains("good        : 3"));
        assert!(text.contains("bad address : 1"));
        assert!(text.contains("total       : 5"));
        assert!(text.contains("malformed   : 2"));
        assert!(text.ends_with("60.0%"));
    }

    #[test]
    fn counters_serialize_by_name() {
        let counters = LinkCounters { good: 3, bad_addr: 1, bad_data: 1, bad_garbage: 0, total: 5 };
        let yaml = serde_yaml_ng::to_string(&counters).unwrap();
        assert!(yaml.contains("bad_addr: 1"));
        let back: LinkCounters = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, counters);
    }
}
