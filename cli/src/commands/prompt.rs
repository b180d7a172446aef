use clap::Args;
use serde_json::{Map, Value, json};

use crate::util::{api_request, exit_error, parse_json_object, read_json_from_file};

#[derive(Args)]
pub struct PromptArgs {
    /// Request for the analyst model
    pub message: String,

    /// Context as a JSON object (e.g. an envelope from `agentflow ask`)
    #[arg(long)]
    pub context: Option<String>,

    /// Read context from a JSON file (use '-' for stdin)
    #[arg(long, conflicts_with = "context")]
    pub context_file: Option<String>,

    /// Skip pretty-printing (raw JSON for piping)
    #[arg(long)]
    pub raw: bool,
}

pub async fn run(api_url: &str, args: PromptArgs) -> i32 {
    let context = if let Some(ref raw) = args.context {
        Some(parse_json_object(raw, "--context").unwrap_or_else(|e| exit_error(&e, None)))
    } else if let Some(ref path) = args.context_file {
        match read_json_from_file(path) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => exit_error("Context file must contain a JSON object", None),
            Err(e) => exit_error(&e, Some("Provide a valid JSON file or use '-' for stdin")),
        }
    } else {
        None
    };

    api_request(
        api_url,
        reqwest::Method::POST,
        "/v1/agent/prompt",
        Some(prompt_body(&args.message, context)),
        &[],
        &[],
        args.raw,
    )
    .await
}

fn prompt_body(message: &str, context: Option<Map<String, Value>>) -> Value {
    let mut body = json!({ "message": message });
    if let Some(context) = context {
        body["context"] = Value::Object(context);
    }
    body
}
