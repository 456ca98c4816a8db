use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "fastdl-ctl")]
#[command(about = "Control client for the FastDL host API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    #[arg(short, long, env = "FASTDL_API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Model,
    Sound,
    Generic,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Kind::Model => "model",
            Kind::Sound => "sound",
            Kind::Generic => "generic",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show server status, download URL and cache occupancy
    Status,
    /// Mark resources as precached
    Precache {
        #[arg(long, value_enum, default_value = "generic")]
        kind: Kind,
        paths: Vec<String>,
    },
    /// Announce a map change (map file, overviews, sky box)
    Activate {
        map: String,
        #[arg(long, default_value = "")]
        sky: String,
    },
    /// Forget all precached resources
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Precache { kind, paths } => {
            let resources: Vec<Value> = paths
                .iter()
                .map(|path| json!({ "kind": kind.as_str(), "path": path }))
                .collect();
            client
                .post(format!("{}/admin/precache", cli.url))
                .json(&json!({ "resources": resources }))
        }
        Commands::Activate { map, sky } => client
            .post(format!("{}/admin/activate", cli.url))
            .json(&json!({ "map": map, "sky_name": sky })),
        Commands::Reset => client.post(format!("{}/admin/reset", cli.url)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: control API returned status {}", status);
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
