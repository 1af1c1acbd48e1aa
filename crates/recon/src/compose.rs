
use serde::Serialize;

use crate::authority::{AuthorityGroup, AuthorityGroups};

/// Composed, unsent message for one manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftEmail {
    pub employee_ids: Vec<String>,
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    /// HTML markup, ready to render.
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Link to the full report, rendered when set.
    pub report_url: Option<String>,
    pub signature: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            report_url: None,
            signature: "Your Team".into(),
        }
    }
}

pub fn subject_for(owner_name: &str) -> String {
    format!("Report for Discrepancies in Employee Data - Manager: {owner_name}")
}

/// One draft per authority group, in group order.
pub fn compose(groups: &AuthorityGroups, options: &ComposeOptions) -> Vec<DraftEmail> {
    groups.iter().map(|group| compose_one(group, options)).collect()
}

fn compose_one(group: &AuthorityGroup, options: &ComposeOptions) -> DraftEmail {
    let subject = subject_for(&group.owner_name);
    DraftEmail {
        employee_ids: group.records.iter().map(|r| r.employee_id.clone()).collect(),
        to_name: group.owner_name.clone(),
        to_email: group.owner_email.clone(),
        body: render_body(group, &subject, options),
        subject,
    }
}

const CELL: &str = "border: 1px solid #ddd; padding: 8px; text-align: center;";
const HEAD: &str = "border: 1px solid #ddd; padding: 8px; background-color: #81c784; color: white;";

fn render_body(group: &AuthorityGroup, subject: &str, options: &ComposeOptions) -> String {
    let owner = escape_html(&group.owner_name);
    let mut out = String::new();

    out.push_str(&format!(
        "<p style=\"font-size: 16px; font-weight: bold;\">Subject: {}</p>\n",
        escape_html(subject)
    ));
    out.push_str(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: auto; border: 1px solid #ccc; \
         padding: 20px; border-radius: 8px; background-color: #f5f5f5;\">\n",
    );
    out.push_str(&format!(
        "<h2 style=\"background-color: #81c784; color: white; padding: 10px 15px;\">Manager Report: {owner}</h2>\n"
    ));
    out.push_str(&format!("<p>Dear {owner},</p>\n"));
    out.push_str(
        "<p>Below is the list of employees under your management along with their current week's \
         data discrepancies compared to the combined data. Please review and take the necessary actions.</p>\n",
    );

    out.push_str("<table style=\"width: 100%; border-collapse: collapse; font-size: 14px;\">\n");
    out.push_str("<thead><tr>\n");
    for heading in ["Employee Name", "Field", "Current Week Value", "Combined Data Value"] {
        out.push_str(&format!("<th style=\"{HEAD}\">{heading}</th>\n"));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for record in &group.records {
        let name = escape_html(&record.employee_name);
        for entry in &record.differences {
            let combined = entry
                .combined_value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default();
            out.push_str(&format!(
                "<tr><td style=\"{CELL}\">{name}</td><td style=\"{CELL}\">{}</td>\
                 <td style=\"{CELL} color: #ff7043;\">{}</td><td style=\"{CELL} color: #388e3c;\">{}</td></tr>\n",
                escape_html(&entry.field),
                escape_html(&entry.current_value.to_string()),
                escape_html(&combined),
            ));
        }
    }
    out.push_str("</tbody>\n</table>\n");

    if let Some(ref url) = options.report_url {
        out.push_str(&format!(
            "<p>You can view the full report and take action by visiting the link below:</p>\
             <a href=\"{}\" style=\"color: #388e3c;\">View Full Report</a>\n",
            escape_html(url)
        ));
    }
    out.push_str(&format!("<p>Thank you,<br>{}</p>\n", escape_html(&options.signature)));
    out.push_str("</div>\n");
    out
}

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
