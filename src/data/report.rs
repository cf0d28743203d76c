//! Output projections: the per-location table, JSON export and the batch CSV summary.

use {
    crate::{
        engine::{BatchOutcome, UserReport},
        models::{LoyaltyLabel, Profile},
        utils::{TimeUtils, format_duration, format_timestamp},
    },
    anyhow::{Context, Result},
    chrono::Local,
    itertools::Itertools,
    std::{fs::File, io::BufWriter, path::Path},
    strum::IntoEnumIterator,
    tabled::{Table, Tabled, settings::Style},
};

/// Steps of the greedy route printed after the transition table.
const ROUTE_STEPS: usize = 4;

/// One row per location.
#[derive(Debug, Clone, Tabled)]
pub struct ProfileRow {
    #[tabled(rename = "Loc")]
    pub location: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Loyalty")]
    pub loyalty: String,
    #[tabled(rename = "Recency")]
    pub recency: String,
    #[tabled(rename = "Depth")]
    pub depth: String,
    #[tabled(rename = "Frequency")]
    pub frequency: String,
    #[tabled(rename = "Visits")]
    pub visits: usize,
    #[tabled(rename = "Dwell (h)")]
    pub dwell_hours: String,
    #[tabled(rename = "First Seen")]
    pub first_visit: String,
    #[tabled(rename = "Last Visit")]
    pub last_visit: String,
    #[tabled(rename = "Days Since")]
    pub days_since: String,
    #[tabled(rename = "Pred (arr/dwell/gap)")]
    pub predictability: String,
    #[tabled(rename = "Pred Index")]
    pub predictability_index: String,
    #[tabled(rename = "Anchor")]
    pub anchor: String,
    #[tabled(rename = "Lat, Lon")]
    pub centroid: String,
}

impl From<&Profile> for ProfileRow {
    fn from(p: &Profile) -> Self {
        let anchor = match (p.candidate_home, p.candidate_work) {
            (true, true) => "home+work",
            (true, false) => "home",
            (false, true) => "work",
            (false, false) => "",
        };
        let location = if p.is_noise {
            format!("{}*", p.location_id)
        } else {
            p.location_id.to_string()
        };

        Self {
            location,
            label: p.label.to_string(),
            loyalty: format!("{:.3}", p.loyalty.value()),
            recency: format!("{:.3}", p.factors.recency.value()),
            depth: format!("{:.3}", p.factors.duration.value()),
            frequency: format!("{:.3}", p.factors.visits.value()),
            visits: p.visit_count,
            dwell_hours: format!("{:.1}", p.total_dwell_hours),
            first_visit: p.first_visit.format(TimeUtils::DATE_FORMAT).to_string(),
            last_visit: p.last_visit.format(TimeUtils::DATE_FORMAT).to_string(),
            days_since: format!("{:.1}", p.days_since_last_visit),
            predictability: format!(
                "{:.2}/{:.2}/{:.2}",
                p.predictability_arrival.value(),
                p.predictability_dwell.value(),
                p.predictability_gap.value()
            ),
            predictability_index: format!("{:.2}", p.predictability_index.value()),
            anchor: anchor.to_string(),
            centroid: p.centroid.to_string(),
        }
    }
}

pub fn render_profile_table(profiles: &[Profile]) -> String {
    let rows: Vec<ProfileRow> = profiles.iter().map(ProfileRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Human-readable summary of one user's run.
pub fn render_user_report(report: &UserReport) -> String {
    let mut out = format!(
        "User {}: {} fixes, {} stay points, {} locations ({} noise)\n",
        report.user_id,
        report.fix_count,
        report.stay_points.len(),
        report.locations.len(),
        report.noise_count()
    );
    if let (Some(start), Some(end)) = (report.collection_start, report.collection_end) {
        out.push_str(&format!(
            "Collected {} to {} ({})\n",
            format_timestamp(start),
            format_timestamp(end),
            format_duration(end - start)
        ));
    }
    if let Some(dbi) = report.davies_bouldin {
        out.push_str(&format!("Davies-Bouldin index: {dbi:.4}\n"));
    }
    if let Some(home) = report.likely_home {
        out.push_str(&format!("Likely home: location {home}\n"));
    }

    out.push_str(&label_counts(&report.profiles));
    out.push_str(&render_profile_table(&report.profiles));
    out.push('\n');

    if let Some(model) = &report.model {
        out.push_str(&model.summary());
        if let Some(home) = report.likely_home {
            let route = model.most_likely_path(home, ROUTE_STEPS);
            if !route.is_empty() {
                out.push_str(&format!("Likely route from home: {}\n", route.iter().join(" -> ")));
            }
        }
    }
    if let Some(metrics) = &report.evaluation {
        out.push_str(&metrics.to_string());
    }
    out
}

/// `Anchor: 2, Habit: 1, ...` in label order.
pub fn label_counts(profiles: &[Profile]) -> String {
    let counts: Vec<String> = LoyaltyLabel::iter()
        .map(|label| {
            let n = profiles.iter().filter(|p| p.label == label).count();
            format!("{label}: {n}")
        })
        .collect();
    format!("{}\n", counts.join(", "))
}

pub fn write_report_json(report: &UserReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

/// Buffers one CSV line per batch outcome and prints them together.
pub struct BatchReporter {
    buffer: Vec<String>,
}

impl Default for BatchReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchReporter {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn add_header(&mut self) {
        self.buffer.push(
            "Timestamp,User,Status,Fixes,StayPoints,Locations,Noise,Anchors,Model_Next,Base_Next,Improve_Pct,Exec_Ms"
                .to_string(),
        );
    }

    pub fn add_outcome(&mut self, outcome: &BatchOutcome) {
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");

        let row = match &outcome.result {
            Ok(report) => {
                let anchors = report.profiles.iter().filter(|p| p.is_anchor()).count();
                let record = report.evaluation.as_ref().map(|m| m.to_record());
                let (model_next, base_next, improve) = match record {
                    Some(r) => (
                        format!("{:.3}", r.model_next_step),
                        format!("{:.3}", r.baseline_next_step),
                        if r.next_step_improvement_defined {
                            format!("{:.2}", r.next_step_improvement_pct)
                        } else {
                            "NaN".to_string()
                        },
                    ),
                    None => (String::new(), String::new(), String::new()),
                };
                format!(
                    "{},{},ok,{},{},{},{},{},{},{},{},{}",
                    ts,
                    outcome.user_id,
                    report.fix_count,
                    report.stay_points.len(),
                    report.locations.len(),
                    report.noise_count(),
                    anchors,
                    model_next,
                    base_next,
                    improve,
                    outcome.elapsed_ms
                )
            }
            Err(e) => format!(
                "{},{},\"error: {}\",,,,,,,,,{}",
                ts,
                outcome.user_id,
                e.to_string().replace('"', "'"),
                outcome.elapsed_ms
            ),
        };
        self.buffer.push(row);
    }

    pub fn lines(&self) -> &[String] {
        &self.buffer
    }

    pub fn print_all(&self) {
        println!();
        println!("==================== CSV DATA START ====================");
        for line in &self.buffer {
            println!("{}", line);
        }
        println!("===================== CSV DATA END =====================");
    }
}
