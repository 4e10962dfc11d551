use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "jsontable-cli")]
#[command(about = "Command-line client for the jsontable users API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users, optionally filtered by name and/or email substring
    List {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Create a user and print its id
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Overwrite the given fields of a user
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a user
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let users = format!("{}/users", cli.url.trim_end_matches('/'));

    let res = match cli.command {
        Commands::List { name, email } => {
            let query: Vec<(&str, String)> = [("name", name), ("email", email)]
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v)))
                .collect();
            client.get(&users).query(&query).send().await?
        }
        Commands::Create { name, email } => {
            let body = serde_json::json!({ "name": name, "email": email });
            client.post(&users).json(&body).send().await?
        }
        Commands::Update { id, name, email } => {
            let mut body = Map::new();
            if let Some(name) = name {
                body.insert("name".into(), Value::String(name));
            }
            if let Some(email) = email {
                body.insert("email".into(), Value::String(email));
            }
            client
                .put(format!("{}/{}", users, id))
                .json(&body)
                .send()
                .await?
        }
        Commands::Delete { id } => client.delete(format!("{}/{}", users, id)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
