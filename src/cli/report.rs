use std::{io::IsTerminal, path::PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::{
    report::{aggregate, chart::render_bar_chart, AppTotal},
    storage::usage_log::{JsonUsageLog, UsageLogStore},
};

const EMPTY_REPORT: &str = "\
No usage data yet.
Start a focus session on the dashboard to see your stats here.";

const ABOUT_DATA: &str = "\
About this data: only time spent on apps you were nudged away from is counted. Everything is
stored locally in the data directory and is not sent anywhere.";

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(long, help = "Print totals as JSON instead of a chart")]
    json: bool,
    #[arg(long, default_value_t = 40, help = "Width of the longest bar")]
    width: usize,
}

fn format_report(totals: &[AppTotal], width: usize, colored: bool) -> String {
    if totals.is_empty() {
        return format!("{EMPTY_REPORT}\n");
    }
    let total_minutes: u64 = totals.iter().map(|v| v.total_duration).sum();
    format!(
        "Time spent on monitored apps ({total_minutes}m in total)\n\n{}\n{ABOUT_DATA}\n",
        render_bar_chart(totals, width, colored)
    )
}

pub async fn process_report_command(command: ReportCommand, dir: PathBuf) -> Result<()> {
    let store = JsonUsageLog::new(dir)?;
    let totals = aggregate(&store.list().await);

    if command.json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else {
        let colored = std::io::stdout().is_terminal();
        print!("{}", format_report(&totals, command.width, colored));
    }
    Ok(())
}
