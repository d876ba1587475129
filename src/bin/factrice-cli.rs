use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "factrice-cli")]
#[command(about = "Client for the factrice email dispatch service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "FACTRICE_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a route's template and send it
    Send {
        /// Route name (template directory)
        route: String,

        #[arg(long)]
        from: Option<String>,

        /// Recipient, may be repeated
        #[arg(long, required = true)]
        to: Vec<String>,

        #[arg(long, default_value = "")]
        subject: String,

        /// Sent as a bearer token
        #[arg(long, env = "FACTRICE_TOKEN")]
        token: Option<String>,

        /// Template data as key=value; dotted keys build nested objects
        #[arg(short, long = "data", value_parser = parse_pair)]
        data: Vec<(String, String)>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

/// Insert `value` at a dotted `key`, creating objects along the way.
fn insert_path(target: &mut Map<String, Value>, key: &str, value: String) {
    match key.split_once('.') {
        None => {
            target.insert(key.to_string(), Value::String(value));
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Send {
            route,
            from,
            to,
            subject,
            token,
            data,
        } => {
            let mut body = Map::new();
            for (key, value) in data {
                insert_path(&mut body, &key, value);
            }
            if let Some(from) = from {
                body.insert("from".into(), Value::String(from));
            }
            body.insert(
                "to".into(),
                Value::Array(to.into_iter().map(Value::String).collect()),
            );
            body.insert("subject".into(), Value::String(subject));

            let mut headers = HeaderMap::new();
            if let Some(token) = token {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token))?,
                );
            }

            let res = client
                .post(format!("{}/{}", cli.url.trim_end_matches('/'), route))
                .headers(headers)
                .json(&Value::Object(body))
                .send()
                .await?;
            if !print_response(res).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or(text);

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: service returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(status.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn test_insert_path_nests() {
        let mut body = Map::new();
        insert_path(&mut body, "name", "Ada".into());
        insert_path(&mut body, "user.city", "Paris".into());
        insert_path(&mut body, "user.zip", "75001".into());
        assert_eq!(
            Value::Object(body),
            json!({ "name": "Ada", "user": { "city": "Paris", "zip": "75001" } })
        );
    }
}
