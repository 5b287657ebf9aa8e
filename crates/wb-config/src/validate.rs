use crate::pipeline::PipelineConfig;
use crate::queue::validate_queue_name;
use crate::types::TimeSpan;

/// Cross-field validation, run once after parsing.
pub fn validate(config: &PipelineConfig) -> anyhow::Result<()> {
    let run = &config.run;

    match run.time_span {
        TimeSpan::Custom => {
            if run.custom_range().is_none() {
                anyhow::bail!(
                    "time_span = \"custom\" requires both start_date and end_date"
                );
            }
        }
        _ => {
            if run.start_date.is_some() || run.end_date.is_some() {
                anyhow::bail!(
                    "start_date/end_date require time_span = \"custom\""
                );
            }
        }
    }
    if let Some((start, end)) = run.custom_range()
        && start > end
    {
        anyhow::bail!("start_date {start} is after end_date {end}");
    }

    if let Some(days) = run.max_lookback_days
        && days <= 0
    {
        anyhow::bail!("max_lookback_days must be positive, got {days}");
    }

    let t = &config.thresholds;
    if !(0.0..=100.0).contains(&t.invalid_percent) {
        anyhow::bail!(
            "thresholds.invalid_percent must be within 0..=100, got {}",
            t.invalid_percent
        );
    }
    if t.window_span_years < 1 {
        anyhow::bail!(
            "thresholds.window_span_years must be at least 1, got {}",
            t.window_span_years
        );
    }

    if config.retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be at least 1");
    }

    if let Some(queue) = &config.queue {
        validate_queue_name(&queue.name)?;
        if let Some(dl) = &queue.dead_letter {
            validate_queue_name(dl)?;
        }
    }

    Ok(())
}
