use crate::classify::BreakpointTable;
use crate::render::escape_html;
use serde::Serialize;

/// How bucket labels are worded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendStyle {
    /// Plain numeric ranges, for integer counts
    Range,
    /// Rates inverted to "1 school per N people"
    PeoplePerSchool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub rows: Vec<LegendRow>,
}

pub fn build_legend(title: &str, table: &BreakpointTable, style: LegendStyle) -> Legend {
    let labels = match style {
        LegendStyle::Range => range_labels(table.thresholds()),
        LegendStyle::PeoplePerSchool => people_per_school_labels(table.thresholds()),
    };

    Legend {
        title: title.to_string(),
        rows: table
            .colors()
            .iter()
            .zip(labels)
            .map(|(color, label)| LegendRow {
                color: color.clone(),
                label,
            })
            .collect(),
    }
}

fn range_labels(thresholds: &[f64]) -> Vec<String> {
    let mut labels = Vec::with_capacity(thresholds.len() + 1);
    let mut lower = 0.0;
    for &t in thresholds {
        labels.push(format!("{}\u{2013}{}", format_number(lower), format_number(t)));
        // Counts are integral, so the next bucket starts one above
        lower = t.floor() + 1.0;
    }
    labels.push(format!("{}+", format_number(lower)));
    labels
}

fn people_per_school_labels(thresholds: &[f64]) -> Vec<String> {
    let people: Vec<String> = thresholds
        .iter()
        .map(|&t| {
            if t > 0.0 {
                group_thousands((1.0 / t).round() as u64)
            } else {
                "\u{221e}".to_string()
            }
        })
        .collect();

    let mut labels = Vec::with_capacity(people.len() + 1);
    for (i, p) in people.iter().enumerate() {
        if i == 0 {
            labels.push(format!("1 school per \u{2265} {} people", p));
        } else {
            labels.push(format!("1 school per {} - {} people", p, people[i - 1]));
        }
    }
    if let Some(last) = people.last() {
        labels.push(format!("1 school per < {} people", last));
    }
    labels
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let whole = value.abs() as u64;
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{}{}", sign, group_thousands(whole))
    } else {
        value.to_string()
    }
}

/// 2500000 -> "2,500,000"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl Legend {
    /// Markup for the `info legend` control.
    pub fn to_html(&self) -> String {
        let mut html = format!("<h4>{}</h4>", escape_html(&self.title));
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                html.push_str("<br>");
            }
            html.push_str(&format!(
                "<i style=\"background:{}\"></i> {}",
                row.color,
                escape_html(&row.label)
            ));
        }
        html
    }
}
