use hashbrown::HashMap;
use parking_lot::Mutex;
use std::io::Write;

/// Collects named diagnostic counters and percentages from anywhere in the
/// crate. Rendering code reports through the shared instance; values are
/// only ever read back in aggregate, so a mutex around the maps is enough.
pub struct StatsAccumulator {
    counters: Mutex<HashMap<String, i64>>,
    // value is (numerator, denominator)
    percentages: Mutex<HashMap<String, (i64, i64)>>
}

lazy_static! {
    static ref STATS_ACCUMULATOR: StatsAccumulator = StatsAccumulator::new();
}

impl StatsAccumulator {
    fn new() -> StatsAccumulator {
        StatsAccumulator {
            counters: Mutex::new(HashMap::new()),
            percentages: Mutex::new(HashMap::new())
        }
    }

    /// The shared accumulator instance.
    pub fn instance() -> &'static StatsAccumulator {
        &STATS_ACCUMULATOR
    }

    pub fn report_counter(&self, name: &str, value: i64) {
        let mut counters = self.counters.lock();
        *counters.entry(name.to_string()).or_insert(0) += value;
    }

    pub fn report_percentage(&self, name: &str, num: i64, denom: i64) {
        let mut percentages = self.percentages.lock();
        let entry = percentages.entry(name.to_string()).or_insert((0, 0));
        entry.0 += num;
        entry.1 += denom;
    }

    pub fn counter(&self, name: &str) -> i64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn percentage(&self, name: &str) -> Option<(i64, i64)> {
        self.percentages.lock().get(name).copied()
    }

    /// Write all gathered statistics to the given sink.
    pub fn print(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        writeln!(dest, "Statistics:")?;
        let counters = self.counters.lock();
        let mut names: Vec<&String> = counters.keys().collect();
        names.sort();
        for name in names {
            writeln!(dest, "    {:<42}{:12}", name, counters[name])?;
        }
        let percentages = self.percentages.lock();
        let mut names: Vec<&String> = percentages.keys().collect();
        names.sort();
        for name in names {
            let (num, denom) = percentages[name];
            if denom > 0 {
                writeln!(dest, "    {:<42}{:12} / {:12} ({:.2}%)",
                    name, num, denom, 100.0 * num as f64 / denom as f64)?;
            }
        }
        Ok(())
    }

    pub fn clear(&self) {
        self.counters.lock().clear();
        self.percentages.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_accumulate() {
        let stats = StatsAccumulator::new();
        stats.report_percentage("test/vignetted", 1, 1);
        stats.report_percentage("test/vignetted", 0, 1);
        stats.report_percentage("test/vignetted", 1, 1);
        assert_eq!(stats.percentage("test/vignetted"), Some((2, 3)));
    }

    #[test]
    fn counters_accumulate() {
        let stats = StatsAccumulator::new();
        stats.report_counter("test/rays", 5);
        stats.report_counter("test/rays", 7);
        assert_eq!(stats.counter("test/rays"), 12);
    }
}
