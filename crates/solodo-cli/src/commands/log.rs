use chrono::NaiveDate;
use clap::Subcommand;
use solodo_core::query::{filter_logs, resolve_tag_names, LogFilter};
use solodo_core::storage::Database;
use solodo_core::timer::format_hms;

#[derive(Subcommand)]
pub enum LogAction {
    /// List study logs, most recent first
    List {
        /// Only logs on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Only logs on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only logs carrying every given tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a study log by id
    Delete {
        /// Log id
        id: i64,
    },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        LogAction::List {
            from,
            to,
            tags,
            json,
        } => {
            let all_tags = db.all_tags()?;
            let mut selected = Vec::new();
            for name in &tags {
                match all_tags.iter().find(|tag| tag.name == *name) {
                    Some(tag) => selected.push(tag.id),
                    None => return Err(format!("unknown tag: {name}").into()),
                }
            }

            let filter = LogFilter {
                start_date: from,
                end_date: to,
                tag_ids: selected,
            };
            let logs = db.all_logs()?;
            let matched = filter_logs(&logs, &filter);

            if json {
                println!("{}", serde_json::to_string_pretty(&matched)?);
            } else {
                for log in matched {
                    let duration = match log.duration_secs() {
                        Some(secs) => format_hms(secs),
                        None => "--:--:--".to_string(),
                    };
                    let names = resolve_tag_names(&log.tag_ids, &all_tags).join(", ");
                    let memo = log.memo.as_deref().unwrap_or("");
                    println!(
                        "{:4}  {}  {}  [{}]  {}",
                        log.id,
                        log.start_time.format("%Y-%m-%d %H:%M"),
                        duration,
                        names,
                        memo
                    );
                }
            }
        }
        LogAction::Delete { id } => {
            if db.delete_log(id)? {
                println!("log {id} deleted");
            } else {
                println!("no such log: {id}");
            }
        }
    }
    Ok(())
}
