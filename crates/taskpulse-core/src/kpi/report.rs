//! Plain-text KPI report.

use super::KpiResult;

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.0}"))
}

impl KpiResult {
    /// Render as a fixed-width text report.
    pub fn render_report(&self) -> String {
        let mut output = String::new();
        output.push_str("\nKPI Report\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!("Range: {}\n", self.range));
        output.push_str(&format!(
            "Health: {} ({})\n\n",
            self.health_status.label(),
            score(self.overall_health_score)
        ));

        if self.completed_task_count == 0 && self.utilization.total_time_entries == 0 {
            output.push_str("No data available.\n");
            return output;
        }

        let e = &self.efficiency;
        output.push_str(&format!("{:<28} {:>10}\n", "Efficiency score", score(e.efficiency_score)));
        output.push_str(&format!(
            "{:<28} {:>4}/{:>2}/{:>2}\n",
            "  under/on/over estimate", e.tasks_under_estimate, e.tasks_on_estimate, e.tasks_over_estimate
        ));
        if let Some(ratio) = e.average_efficiency_ratio {
            output.push_str(&format!("{:<28} {:>9.2}x\n", "  average actual/estimate", ratio));
        }

        let a = &self.accuracy;
        output.push_str(&format!("{:<28} {:>10}\n", "Accuracy score", score(a.accuracy_score)));
        if let Some(mape) = a.mean_absolute_percentage_error {
            output.push_str(&format!("{:<28} {:>9.1}%\n", "  mean abs. error", mape));
        }
        output.push_str(&format!(
            "{:<28} {:>4}/{:>2}\n",
            "  within 10%/25%", a.estimates_within_10_percent, a.estimates_within_25_percent
        ));

        let u = &self.utilization;
        output.push_str(&format!("{:<28} {:>10}\n", "Utilization score", score(u.utilization_score)));
        output.push_str(&format!(
            "{:<28} {:>7.1}/{:.1}h\n",
            "  person-hours tracked", u.total_person_hours_tracked, u.available_person_hours
        ));
        output.push_str(&format!("{:<28} {:>9.0}%\n", "  utilization", u.utilization_percentage));
        if u.is_under_utilized {
            output.push_str("  ! under-utilized\n");
        } else if u.is_over_utilized {
            output.push_str("  ! over-utilized\n");
        }

        output.push_str(&"-".repeat(60));
        output.push('\n');
        output
    }
}
