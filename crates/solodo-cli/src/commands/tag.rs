use clap::Subcommand;
use solodo_core::storage::Database;

#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    Add {
        /// Tag name (must be unique)
        name: String,
    },
    /// Delete a tag and scrub it from existing study logs
    Delete {
        /// Tag name
        name: String,
    },
    /// List all tags
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TagAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TagAction::Add { name } => {
            let name = name.trim();
            if name.is_empty() {
                eprintln!("tag name must not be empty");
                std::process::exit(1);
            }
            let id = db.add_tag(name)?;
            println!("tag '{name}' created (id {id})");
        }
        TagAction::Delete { name } => match db.delete_tag(&name)? {
            Some(scrubbed) => println!("tag '{name}' deleted; {scrubbed} log(s) updated"),
            None => println!("no such tag: {name}"),
        },
        TagAction::List { json } => {
            let tags = db.all_tags()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                for tag in tags {
                    println!("{:4}  {}", tag.id, tag.name);
                }
            }
        }
    }
    Ok(())
}
