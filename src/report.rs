use std::fmt::Write;

use crate::dashboard::{is_small_sample, DashboardSnapshot};
use crate::filters::DashboardFilters;
use crate::health::{dispatch_freshness, net_ease_status, nps_status, VIBE_BAND};
use crate::rankings::{self, RankedItem};
use crate::segments::SegmentMetrics;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub top_drivers: usize,
    pub top_preferences: usize,
    pub preference_search: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_drivers: rankings::DRIVER_DISPLAY_LIMIT,
            top_preferences: rankings::PREFERENCE_DISPLAY_LIMIT,
            preference_search: None,
        }
    }
}

fn sample_note(count: usize) -> &'static str {
    if is_small_sample(count) {
        " (small sample)"
    } else {
        ""
    }
}

fn write_ranked(output: &mut String, items: &[RankedItem], limit: usize) {
    if items.is_empty() {
        let _ = writeln!(output, "No answers recorded for this window.");
        return;
    }
    for (position, item) in rankings::top(items, limit).iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {}: {}% ({} of {})",
            position + 1,
            item.label,
            item.percentage,
            item.count,
            item.total
        );
    }
}

fn write_segments(output: &mut String, title: &str, segments: &[SegmentMetrics]) {
    let _ = writeln!(output, "### {title}");
    if segments.is_empty() {
        let _ = writeln!(output, "No responses for this dimension.");
        let _ = writeln!(output);
        return;
    }
    let _ = writeln!(output, "| Segment | NPS | Net Ease | Responses |");
    let _ = writeln!(output, "|---|---:|---:|---:|");
    for segment in segments {
        let _ = writeln!(
            output,
            "| {} | {} ({}) | {} ({}) | {}{} |",
            segment.name,
            segment.nps,
            nps_status(segment.nps).label(),
            segment.net_ease,
            net_ease_status(segment.net_ease).label(),
            segment.count,
            sample_note(segment.count)
        );
    }
    let _ = writeln!(output);
}

pub fn build_report(
    filters: &DashboardFilters,
    snapshot: &DashboardSnapshot,
    options: &ReportOptions,
) -> String {
    let kpis = &snapshot.kpis;
    let mut output = String::new();

    let _ = writeln!(output, "# Event Feedback Report");
    let _ = writeln!(output, "Generated for {}", filters.describe());
    let _ = writeln!(output);

    let _ = writeln!(output, "## Headline");
    if is_small_sample(kpis.sample_size) {
        let _ = writeln!(
            output,
            "> Only {} responses in scope; treat these numbers with care.",
            kpis.sample_size
        );
    }
    let _ = writeln!(
        output,
        "- NPS: {} ({}% promoters, {}% detractors, {} answers){}",
        kpis.nps.value,
        kpis.nps.promoters,
        kpis.nps.detractors,
        kpis.nps.responses,
        sample_note(kpis.nps.responses)
    );
    let _ = writeln!(
        output,
        "- Net Ease: {} ({}% easy, {}% difficult, {} answers){}",
        kpis.net_ease.value,
        kpis.net_ease.easy,
        kpis.net_ease.difficult,
        kpis.net_ease.responses,
        sample_note(kpis.net_ease.responses)
    );
    let _ = writeln!(
        output,
        "- Return intent: {}% ({}, {} of {} answers)",
        kpis.vibe_positive.value,
        VIBE_BAND.classify(kpis.vibe_positive.value).label(),
        kpis.vibe_positive.positive,
        kpis.vibe_positive.responses
    );
    let _ = writeln!(
        output,
        "- Response rate: {}% ({} of {} invites)",
        kpis.response_rate.value, kpis.response_rate.responses, kpis.response_rate.invites
    );
    let _ = writeln!(output, "- Dispatch delay: {}h", kpis.delay_hours.value);

    let _ = writeln!(output);
    let _ = writeln!(output, "## NPS x Vibe");
    if snapshot.matrix.total() == 0 {
        let _ = writeln!(output, "No respondents answered both questions.");
    } else {
        for (name, cell) in snapshot.matrix.cells() {
            let _ = writeln!(
                output,
                "- {}: {}% ({} respondents){}",
                name,
                cell.percentage,
                cell.count,
                sample_note(cell.count)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trophies");
    write_ranked(&mut output, &snapshot.drivers.trophies, options.top_drivers);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Frustrations");
    write_ranked(&mut output, &snapshot.drivers.frustrations, options.top_drivers);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Wayfinding");
    for bucket in &snapshot.wayfinding.distribution {
        let _ = writeln!(
            output,
            "- {}: {}% ({})",
            bucket.label, bucket.percentage, bucket.count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Segments");
    write_segments(&mut output, "Event type", &snapshot.segments.by_event_type);
    write_segments(&mut output, "Gender", &snapshot.segments.by_gender);
    write_segments(&mut output, "Age", &snapshot.segments.by_age);
    write_segments(&mut output, "Transport", &snapshot.segments.by_transport);

    let _ = writeln!(output, "## Preferences");
    let term = options.preference_search.as_deref().unwrap_or("");
    let preferences =
        rankings::search_preferences(&snapshot.preferences, term, options.top_preferences);
    if preferences.is_empty() {
        let _ = writeln!(output, "No preferences match.");
    } else {
        for preference in preferences {
            let _ = writeln!(output, "- {} ({})", preference.label, preference.count);
        }
    }

    let health = &snapshot.health;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Collection Health");
    let status = health.status();
    let _ = writeln!(
        output,
        "- Response rate: {}% ({})",
        health.response_rate,
        status.response_rate.label()
    );
    let _ = writeln!(
        output,
        "- Completeness: {}% ({})",
        health.completeness,
        status.completeness.label()
    );
    let _ = writeln!(
        output,
        "- Dispatch delay: {}h ({}, {}% inside the 48h target)",
        health.delay,
        status.delay.label(),
        dispatch_freshness(health.delay)
    );

    output
}
