use clap::Args;
use serde_json::{Value, json};

use agentflow_core::{AgentRequest, AgentResponse};

use crate::util::{
    build_url, client, exit_code_for_status, exit_error, parse_json_object, print_json, send,
};

#[derive(Args)]
pub struct AskArgs {
    /// Free-text request (e.g. "check for anomaly yesterday")
    pub message: String,

    /// Request metadata as a JSON object
    #[arg(long)]
    pub metadata: Option<String>,

    /// Skip pretty-printing (raw JSON for piping)
    #[arg(long)]
    pub raw: bool,
}

pub async fn ask(api_url: &str, args: AskArgs) -> i32 {
    let metadata = args.metadata.as_deref().map(|raw| {
        parse_json_object(raw, "--metadata")
            .unwrap_or_else(|e| exit_error(&e, Some("Example: --metadata '{\"source\":\"cli\"}'")))
    });

    let url = match build_url(api_url, "/v1/agent", &[]) {
        Ok(u) => u,
        Err(e) => exit_error(&e, Some("Check --api-url / AGENTFLOW_API_URL")),
    };
    let request = AgentRequest {
        message: args.message,
        metadata,
    };

    let (status, body) = match send(client().post(url).json(&request)).await {
        Ok(r) => r,
        Err(code) => return code,
    };

    let code = exit_code_for_status(status);
    if code != 0 {
        print_json(&body, args.raw, true);
        return code;
    }

    match decode_envelope(body) {
        Ok(envelope) => {
            let value = serde_json::to_value(&envelope).unwrap_or(Value::Null);
            print_json(&value, args.raw, false);
            0
        }
        Err(e) => {
            print_json(
                &json!({
                    "error": "invalid_envelope",
                    "message": format!("Server returned a malformed agent envelope: {e}")
                }),
                false,
                true,
            );
            2
        }
    }
}

/// Decode a server envelope. `actions_taken` goes through the action
/// normalizer, so loosely shaped entries come back in canonical form.
pub fn decode_envelope(body: Value) -> Result<AgentResponse, serde_json::Error> {
    serde_json::from_value(body)
}
