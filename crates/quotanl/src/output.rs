use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use quotanl_client::Notification;
use quotanl_transport::Family;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct NotificationOutput<'a> {
    #[serde(flatten)]
    notification: &'a Notification,
    /// Device as `major:minor`.
    device: String,
    timestamp: String,
}

pub fn print_notification(n: &Notification, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", notification_json(n)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "ID", "DEVICE", "WARNING", "CAUSED BY"])
                .add_row(vec![
                    n.quota_type.to_string(),
                    n.id.to_string(),
                    device(n),
                    n.warning.to_string(),
                    n.caused_id.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} {} on {}: {} (caused by {})",
                n.quota_type,
                n.id,
                device(n),
                n.warning,
                n.caused_id
            );
        }
    }
}

pub fn print_family(family: &Family, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(family).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FAMILY", "FAMILY ID", "VERSION", "GROUP", "GROUP ID"]);
            if family.groups.is_empty() {
                table.add_row(vec![
                    family.name.clone(),
                    family.id.to_string(),
                    family.version.to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]);
            }
            for group in &family.groups {
                table.add_row(vec![
                    family.name.clone(),
                    family.id.to_string(),
                    family.version.to_string(),
                    group.name.clone(),
                    group.id.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "family={} id={} version={}",
                family.name, family.id, family.version
            );
            for group in &family.groups {
                println!("  group={} id={}", group.name, group.id);
            }
        }
    }
}

fn notification_json(n: &Notification) -> String {
    let out = NotificationOutput {
        notification: n,
        device: device(n),
        timestamp: now_unix_seconds(),
    };
    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
}

fn device(n: &Notification) -> String {
    format!("{}:{}", n.device_major, n.device_minor)
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
