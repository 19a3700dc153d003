use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "ms-cli")]
#[command(about = "JSON gateway client for ms-project", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Session token from `login`
    #[arg(short, long, env = "MS_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange credentials for a session token
    Login { username: String, password: String },
    /// End the current session
    Logout,
    /// Round-trip a value through the test service
    Ping { value: String },
    /// Movie catalog
    Movies {
        #[command(subcommand)]
        command: MovieCommands,
    },
    /// User accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum MovieCommands {
    List {
        #[arg(long, default_value_t = 0)]
        page_size: i32,
        #[arg(long)]
        page_token: Option<String>,
    },
    Get { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
enum UserCommands {
    List {
        #[arg(long, default_value_t = 0)]
        page_size: i32,
        #[arg(long)]
        page_token: Option<String>,
    },
    Get { username: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Basic {token}"))?);
    }

    let res = match cli.command {
        Commands::Login { username, password } => {
            client
                .post(format!("{}/v1/auth/login", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?
        }
        Commands::Logout => {
            client
                .post(format!("{}/v1/auth/logout", cli.url))
                .headers(headers)
                .json(&json!({}))
                .send()
                .await?
        }
        Commands::Ping { value } => {
            client
                .post(format!("{}/v1/ping", cli.url))
                .headers(headers)
                .json(&json!({ "value": value }))
                .send()
                .await?
        }
        Commands::Movies { command } => match command {
            MovieCommands::List { page_size, page_token } => {
                client
                    .get(format!("{}/v1/movies", cli.url))
                    .headers(headers)
                    .query(&page_query(page_size, page_token))
                    .send()
                    .await?
            }
            MovieCommands::Get { id } => {
                client
                    .get(format!("{}/v1/movies/{id}", cli.url))
                    .headers(headers)
                    .send()
                    .await?
            }
            MovieCommands::Delete { id } => {
                client
                    .delete(format!("{}/v1/movies/{id}", cli.url))
                    .headers(headers)
                    .send()
                    .await?
            }
        },
        Commands::Users { command } => match command {
            UserCommands::List { page_size, page_token } => {
                client
                    .get(format!("{}/v1/users", cli.url))
                    .headers(headers)
                    .query(&page_query(page_size, page_token))
                    .send()
                    .await?
            }
            UserCommands::Get { username } => {
                client
                    .get(format!("{}/v1/users/{username}", cli.url))
                    .headers(headers)
                    .send()
                    .await?
            }
        },
    };

    print_response(res).await
}

fn page_query(page_size: i32, page_token: Option<String>) -> Vec<(&'static str, String)> {
    let mut query = vec![("page_size", page_size.to_string())];
    if let Some(token) = page_token {
        query.push(("page_token", token));
    }
    query
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
