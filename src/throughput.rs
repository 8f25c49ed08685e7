//! Reduction of per-thread timings into throughput figures.

use crate::decode_loop::LoopTiming;
use crate::fan_out::FanOutReport;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub threads: usize,
    pub repetitions: u32,
    /// Decodes per second across all threads, over the fan-out wall clock.
    pub aggregate: f64,
    /// Decodes per second of an average thread.
    pub per_thread: f64,
    /// Decoded bits per frame, for the bit-rate figure.
    pub bits_per_decode: u64,
}

/// `count / seconds`, with an empty span reported as infinite.
fn rate(count: f64, span: Duration) -> f64 {
    let secs = span.as_secs_f64();
    if secs > 0.0 { count / secs } else { f64::INFINITY }
}

impl Throughput {
    pub fn from_single(timing: &LoopTiming, bits_per_decode: u64) -> Self {
        let dps = rate(timing.repetitions as f64, timing.elapsed);
        Self {
            threads: 1,
            repetitions: timing.repetitions,
            aggregate: dps,
            per_thread: dps,
            bits_per_decode,
        }
    }

    /// Aggregate = repetitions x threads / wall clock; per thread = threads /
    /// sum of per-thread average decode times.
    pub fn from_fan_out(report: &FanOutReport, repetitions: u32, bits_per_decode: u64) -> Self {
        let threads = report.threads.len();
        if threads == 1 {
            return Self::from_single(&report.threads[0], bits_per_decode);
        }
        let total_average: Duration = report
            .threads
            .iter()
            .map(LoopTiming::average_per_repetition)
            .sum();
        Self {
            threads,
            repetitions,
            aggregate: rate(repetitions as f64 * threads as f64, report.wall),
            per_thread: rate(threads as f64, total_average),
            bits_per_decode,
        }
    }

    pub fn megabits_per_second(&self) -> f64 {
        self.aggregate * self.bits_per_decode as f64 / 1e6
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.threads == 1 {
            writeln!(f, "Decodes/s: {:.2}", self.aggregate)?;
        } else {
            writeln!(f, "Aggregate decodes/s: {:.2}", self.aggregate)?;
            writeln!(f, "Average decodes/s/thread: {:.2}", self.per_thread)?;
        }
        write!(f, "Throughput: {:.1} Mbit/s", self.megabits_per_second())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(repetitions: u32, millis: u64) -> LoopTiming {
        LoopTiming {
            repetitions,
            elapsed: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_single_thread_rate() {
        let t = Throughput::from_single(&timing(100, 500), 8);
        assert_eq!(t.aggregate, 200.0);
        assert_eq!(t.per_thread, 200.0);
        assert!((t.megabits_per_second() - 1600.0 / 1e6).abs() < 1e-12);
        assert_eq!(t.to_string(), "Decodes/s: 200.00\nThroughput: 0.0 Mbit/s");
    }

    #[test]
    fn test_fan_out_rates() {
        let report = FanOutReport {
            threads: vec![timing(100, 1000), timing(100, 2000)],
            wall: Duration::from_secs(2),
        };
        let t = Throughput::from_fan_out(&report, 100, 1_000_000);
        // 200 decodes over 2 s of wall clock.
        assert_eq!(t.aggregate, 100.0);
        // Averages of 10 ms and 20 ms: 2 threads / 30 ms.
        assert!((t.per_thread - 2.0 / 0.030).abs() < 1e-9);
        assert_eq!(t.megabits_per_second(), 100.0);
        let text = t.to_string();
        assert!(text.starts_with("Aggregate decodes/s: 100.00\nAverage decodes/s/thread: 66.67"));
    }

    #[test]
    fn test_one_thread_fan_out_matches_single() {
        let report = FanOutReport {
            threads: vec![timing(40, 200)],
            wall: Duration::from_millis(210),
        };
        let t = Throughput::from_fan_out(&report, 40, 0);
        assert_eq!(t.threads, 1);
        assert_eq!(t.aggregate, 200.0);
    }

    #[test]
    fn test_zero_span_is_infinite() {
        assert!(Throughput::from_single(&timing(1, 0), 8).aggregate.is_infinite());
    }
}
