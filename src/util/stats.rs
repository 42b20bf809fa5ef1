use std::fmt::Display;

/// Running min/max/average accumulator for integer-valued samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    sum: f64,
}

impl Stats {
    pub fn new_single(value: usize) -> Stats {
        let mut stats = Stats::default();
        stats.add_sample(value);
        stats
    }

    pub fn add_sample(&mut self, value: usize) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value as f64;
    }

    pub fn add_samples(&mut self, values: impl IntoIterator<Item = usize>) {
        for value in values {
            self.add_sample(value);
        }
    }

    pub fn merge(&self, other: &Stats) -> Stats {
        Stats {
            count: self.count + other.count,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            sum: self.sum + other.sum,
        }
    }

    /// Shifts every recorded sample by a constant.
    pub fn offset(&mut self, delta: usize) {
        if self.count == 0 {
            return;
        }
        self.min += delta;
        self.max += delta;
        self.sum += (delta * self.count) as f64;
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn total(&self) -> usize {
        self.sum as usize
    }
}

impl Default for Stats {
    fn default() -> Stats {
        Stats {
            count: 0,
            min: usize::MAX,
            max: 0,
            sum: 0.0,
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "no samples");
        }
        write!(
            f,
            "{} - {}; avg {:.1}; {} samples",
            self.min,
            self.max,
            self.avg(),
            self.count
        )
    }
}
