use chrono::Utc;
use clap::Subcommand;

use chronobank_core::{aggregate, CompletedSession, SessionDb};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today/week/month/all-time earnings and hours
    Summary,
    /// List raw completed sessions
    Sessions,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = SessionDb::open()?;

    match action {
        StatsAction::Summary => {
            let records = db.list_all()?;
            let sessions: Vec<CompletedSession> = records.iter().map(Into::into).collect();
            let agg = aggregate(&sessions, Utc::now());
            println!("{}", serde_json::to_string_pretty(&agg)?);
        }
        StatsAction::Sessions => {
            let records = db.list_all()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
