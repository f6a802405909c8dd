use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "todo-cli")]
#[command(about = "Command line client for the todo service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "TODO_SERVICE_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all todos
    List,
    /// Add a todo
    Add {
        /// Task text
        task: String,
    },
    /// Mark a todo as completed
    Done {
        id: i64,
        /// Mark as not completed instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete a todo
    Delete { id: i64 },
    /// Check service and database health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::List => client.get(format!("{}/todos", base)).send().await?,
        Commands::Add { task } => {
            client
                .post(format!("{}/todos", base))
                .json(&json!({ "task": task }))
                .send()
                .await?
        }
        Commands::Done { id, undo } => {
            client
                .put(format!("{}/todos/{}", base, id))
                .json(&json!({ "completed": !undo }))
                .send()
                .await?
        }
        Commands::Delete { id } => client.delete(format!("{}/todos/{}", base, id)).send().await?,
        Commands::Health => client.get(format!("{}/healthz", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: todo service returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text.trim_end());
        }
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if text.trim().is_empty() => println!("{}", status),
        Err(_) => println!("{}", text.trim_end()),
    }
    Ok(())
}
