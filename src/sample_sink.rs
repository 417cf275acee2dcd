use crate::Key;
use itertools::Itertools;
use std::io::Write;

pub trait SampleSink {
    fn record(&mut self, key: Key);
}

#[derive(Default, Clone, Debug)]
pub struct SampleCounter {
    number_of_samples: usize,
}

impl SampleSink for SampleCounter {
    fn record(&mut self, _key: Key) {
        self.number_of_samples += 1;
    }
}

impl SampleCounter {
    pub fn number_of_samples(&self) -> usize {
        self.number_of_samples
    }
}

#[derive(Clone, Debug)]
pub struct FrequencyCount {
    number_of_samples: usize,
    frequencies: Vec<usize>,
}

impl FrequencyCount {
    pub fn new(number_of_keys: usize) -> Self {
        Self {
            number_of_samples: 0,
            frequencies: vec![0; number_of_keys],
        }
    }

    pub fn frequencies(&self) -> &[usize] {
        &self.frequencies
    }

    pub fn number_of_samples(&self) -> usize {
        self.number_of_samples
    }

    pub fn sample_distribution(&self) -> Vec<(usize, usize)> {
        sample_distribution(self.frequencies.iter().copied())
    }

    pub fn report_distribution(&self, writer: &mut impl Write) -> std::io::Result<()> {
        let sample_distr = self.sample_distribution();
        report_distribution(&sample_distr, writer)
    }
}

impl SampleSink for FrequencyCount {
    fn record(&mut self, key: Key) {
        self.number_of_samples += 1;
        self.frequencies[key as usize] += 1;
    }
}

/// Histogram over how often each draw frequency occurred, sorted by frequency.
pub fn sample_distribution(frequencies: impl Iterator<Item = usize>) -> Vec<(usize, usize)> {
    let mut counts = frequencies.counts().into_iter().collect_vec();
    counts.sort_unstable();
    counts
}

pub fn report_distribution(
    sample_distr: &[(usize, usize)],
    writer: &mut impl Write,
) -> std::io::Result<()> {
    writer.write_all(
        sample_distr
            .iter()
            .map(|&(f, n)| format!("#SF {:>10}, {:>10}\n", f, n))
            .join("")
            .as_bytes(),
    )?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frequency_histogram_counts_keys() {
        let mut sink = FrequencyCount::new(4);
        for key in [0u64, 1, 1, 3, 3, 3] {
            sink.record(key);
        }

        assert_eq!(sink.number_of_samples(), 6);
        assert_eq!(sink.frequencies(), &[1, 2, 0, 3]);
        // one key was never drawn, one once, one twice, one three times
        assert_eq!(sink.sample_distribution(), vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn report_lines_are_tagged_and_aligned() {
        let mut sink = FrequencyCount::new(3);
        for key in [0u64, 0, 2] {
            sink.record(key);
        }

        let mut out = Vec::new();
        sink.report_distribution(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "#SF          0,          1\n#SF          1,          1\n#SF          2,          1\n");
    }
}
