use super::types::*;
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::collections::BTreeMap;

impl DayPart {
    pub const ALL: [DayPart; 3] = [DayPart::Morning, DayPart::Day, DayPart::Evening];

    /// Whether a local time of day falls in this part. Evening wraps past
    /// midnight. Exactly 03:00 and anything from 23:00 up to midnight belong
    /// to no part.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let secs = time.num_seconds_from_midnight();
        match self {
            DayPart::Morning => secs > hms(3, 0) && secs < hms(12, 0),
            DayPart::Day => secs >= hms(12, 0) && secs <= hms(18, 0),
            DayPart::Evening => {
                (secs > hms(18, 0) && secs < hms(23, 0)) || secs < hms(3, 0)
            }
        }
    }
}

fn hms(hour: u32, minute: u32) -> u32 {
    hour * 3600 + minute * 60
}

/// Groups samples by calendar date and summarises each day.
pub fn group_into_days(samples: &[ForecastSample]) -> ForecastDays {
    let mut grouped: BTreeMap<NaiveDate, Vec<ForecastSample>> = BTreeMap::new();
    for sample in samples {
        grouped.entry(sample.date()).or_default().push(sample.clone());
    }

    grouped
        .into_iter()
        .map(|(date, list)| (date, summarize_day(list)))
        .collect()
}

fn summarize_day(list: Vec<ForecastSample>) -> DayBucket {
    let mut parts: DayParts<Vec<ForecastSample>> = DayParts::default();
    for sample in &list {
        for part in DayPart::ALL.iter().filter(|p| p.contains(sample.time)) {
            parts.get_mut(*part).push(sample.clone());
        }
    }

    let min_temp = list.iter().map(|s| s.temp).fold(f64::INFINITY, f64::min);
    let max_temp = list.iter().map(|s| s.temp).fold(f64::NEG_INFINITY, f64::max);

    let [morning, day, evening] = DayPart::ALL.map(|part| summarize_part(parts.get(part)));
    let main_weather = DayParts {
        morning,
        day,
        evening,
    };

    DayBucket {
        list,
        parts,
        min_temp,
        max_temp,
        main_weather,
    }
}

fn summarize_part(samples: &[ForecastSample]) -> PartSummary {
    let temp_sum: f64 = samples.iter().map(|s| s.temp).sum();
    let temp = temp_sum / samples.len().max(1) as f64;

    match dominant_condition(samples) {
        Some((main, description, icon)) => PartSummary {
            main: Some(main.to_string()),
            description: Some(description.to_string()),
            icon: Some(icon.to_string()),
            temp,
        },
        None => PartSummary {
            temp,
            ..Default::default()
        },
    }
}

/// Most frequent `(main, description, icon)` across all conditions of the
/// samples. Ties go to the triple seen first.
fn dominant_condition(samples: &[ForecastSample]) -> Option<(&str, &str, &str)> {
    let mut counts: Vec<((&str, &str, &str), usize)> = Vec::new();

    for condition in samples.iter().flat_map(|s| s.weather.iter()) {
        let triple = (
            condition.main.as_str(),
            condition.description.as_str(),
            condition.icon.as_str(),
        );
        match counts.iter_mut().find(|(t, _)| *t == triple) {
            Some((_, count)) => *count += 1,
            None => counts.push((triple, 1)),
        }
    }

    let mut best: Option<((&str, &str, &str), usize)> = None;
    for (triple, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((triple, count));
        }
    }
    best.map(|(triple, _)| triple)
}
