use std::time::Duration;

use tracing::info;

use crate::distributor::Distribution;

/// `4 * hits / total_count`. Divides by the requested budget, not the number
/// of samples drawn. NaN when `total_count` is zero.
pub fn estimate(total_hits: u64, total_count: u64) -> f64 {
    4.0 * total_hits as f64 / total_count as f64
}

pub fn format_estimate(pi_estimate: f64) -> String {
    format!("pi estimate = {:.8}", pi_estimate)
}

/// Everything the coordinator knows once the reduction has completed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub distribution: Distribution,
    pub local_hits: u64,
    pub total_hits: u64,
    pub estimate: f64,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn new(distribution: Distribution, local_hits: u64, total_hits: u64, elapsed: Duration) -> Self {
        RunReport {
            distribution,
            local_hits,
            total_hits,
            estimate: estimate(total_hits, distribution.budget),
            elapsed,
        }
    }

    pub fn error(&self) -> f64 {
        std::f64::consts::PI - self.estimate
    }

    pub fn summary_line(&self) -> String {
        format_estimate(self.estimate)
    }

    pub fn log(&self) {
        info!(
            budget = self.distribution.budget,
            processes = self.distribution.processes.get(),
            share = self.distribution.share,
            drawn = self.distribution.drawn(),
            dropped = self.distribution.dropped(),
            total_hits = self.total_hits,
            error = self.error(),
            elapsed = ?self.elapsed,
            "Monte Carlo pi estimation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use tracing_test::traced_test;

    #[test]
    fn all_hits_gives_four() {
        assert_eq!(estimate(10, 10), 4.0);
    }

    #[test]
    fn no_hits_gives_zero() {
        assert_eq!(estimate(0, 10), 0.0);
    }

    #[test]
    fn estimate_stays_in_bounds() {
        for count in 1..50u64 {
            for hits in 0..=count {
                let e = estimate(hits, count);
                assert!((0.0..=4.0).contains(&e));
            }
        }
    }

    #[test]
    fn zero_budget_is_nan() {
        assert!(estimate(0, 0).is_nan());
    }

    #[test]
    fn formats_eight_decimals() {
        assert_eq!(format_estimate(3.0), "pi estimate = 3.00000000");
        assert_eq!(format_estimate(estimate(78, 100)), "pi estimate = 3.12000000");
        assert_eq!(format_estimate(std::f64::consts::PI), "pi estimate = 3.14159265");
    }

    #[test]
    fn report_divides_by_requested_budget() {
        let plan = Distribution::plan(10, NonZeroUsize::new(3).unwrap());
        let report = RunReport::new(plan, 3, 9, Duration::ZERO);
        assert_eq!(report.estimate, 3.6);
        assert_eq!(report.summary_line(), "pi estimate = 3.60000000");
    }

    #[traced_test]
    #[test]
    fn report_logs_sub_millisecond_elapsed_time() {
        let plan = Distribution::plan(100, NonZeroUsize::new(4).unwrap());
        let report = RunReport::new(plan, 20, 78, Duration::from_micros(3_500_250));
        report.log();
        assert!(logs_contain("elapsed=3.50025s"));
        assert!(logs_contain("total_hits=78"));
    }
}
