use std::{collections::BTreeMap, time::Instant};

/// Accumulated wall time of one processor function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    pub calls: u64,
    pub total_nanos: u128,
}

pub type Timings = BTreeMap<String, TimerStats>;

pub struct EventTimer {
    span: String,
    start_time: Instant,
    block_height: u32,
}

pub fn start_timer(span: impl Into<String>, block_height: u32) -> EventTimer {
    EventTimer {
        span: span.into(),
        start_time: Instant::now(),
        block_height,
    }
}

pub fn stop_timer(timer: &EventTimer, event: &str, timings: &mut Timings) {
    let duration = timer.start_time.elapsed();
    let label = format!("{}#{}", timer.span, event);
    tracing::trace!(
        "{} took {}ns at height {}",
        label,
        duration.as_nanos(),
        timer.block_height
    );
    let stats = timings.entry(label).or_default();
    stats.calls += 1;
    stats.total_nanos += duration.as_nanos();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_timer_accumulates_per_label() {
        let mut timings = Timings::new();
        let timer = start_timer("Brc20Indexer", 1);
        stop_timer(&timer, "mint_inscribe", &mut timings);
        stop_timer(&timer, "mint_inscribe", &mut timings);
        stop_timer(&timer, "deploy_inscribe", &mut timings);

        assert_eq!(timings.len(), 2);
        assert_eq!(timings["Brc20Indexer#mint_inscribe"].calls, 2);
        assert_eq!(timings["Brc20Indexer#deploy_inscribe"].calls, 1);
    }
}
