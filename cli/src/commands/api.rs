use clap::Args;

use crate::util::{api_request, exit_error, read_json_from_file};

#[derive(Args)]
pub struct ApiArgs {
    /// HTTP method (GET, POST, PUT, DELETE, PATCH)
    pub method: String,

    /// API path (e.g. /v1/agent)
    pub path: String,

    /// Request body as JSON string
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Read request body from file (use '-' for stdin)
    #[arg(long, short = 'f', conflicts_with = "data")]
    pub data_file: Option<String>,

    /// Query parameters (repeatable: key=value)
    #[arg(long, short = 'q')]
    pub query: Vec<String>,

    /// Extra headers (repeatable: Key:Value)
    #[arg(long, short = 'H')]
    pub header: Vec<String>,

    /// Skip pretty-printing (raw JSON for piping)
    #[arg(long)]
    pub raw: bool,
}

pub async fn run(api_url: &str, args: ApiArgs) -> i32 {
    let method = parse_method(&args.method).unwrap_or_else(|| {
        exit_error(
            &format!("Unknown HTTP method: {}", args.method),
            Some("Supported methods: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS"),
        )
    });

    let query = parse_pairs(&args.query, '=').unwrap_or_else(|q| {
        exit_error(
            &format!("Invalid query parameter: '{q}'"),
            Some("Format: key=value, e.g. --query run_dedup=false"),
        )
    });

    let headers = parse_pairs(&args.header, ':').unwrap_or_else(|h| {
        exit_error(
            &format!("Invalid header: '{h}'"),
            Some("Format: Key:Value, e.g. --header x-request-id:debug-1"),
        )
    });

    let body = if let Some(ref d) = args.data {
        match serde_json::from_str(d) {
            Ok(v) => Some(v),
            Err(e) => exit_error(
                &format!("Invalid JSON in --data: {e}"),
                Some("Provide valid JSON string"),
            ),
        }
    } else if let Some(ref f) = args.data_file {
        match read_json_from_file(f) {
            Ok(v) => Some(v),
            Err(e) => exit_error(&e, Some("Provide a valid JSON file or use '-' for stdin")),
        }
    } else {
        None
    };

    api_request(api_url, method, &args.path, body, &query, &headers, args.raw).await
}

fn parse_method(raw: &str) -> Option<reqwest::Method> {
    match raw.to_uppercase().as_str() {
        "GET" => Some(reqwest::Method::GET),
        "POST" => Some(reqwest::Method::POST),
        "PUT" => Some(reqwest::Method::PUT),
        "DELETE" => Some(reqwest::Method::DELETE),
        "PATCH" => Some(reqwest::Method::PATCH),
        "HEAD" => Some(reqwest::Method::HEAD),
        "OPTIONS" => Some(reqwest::Method::OPTIONS),
        _ => None,
    }
}

/// Split `key<sep>value` items, trimming both sides. Returns the first
/// malformed item as the error.
fn parse_pairs(items: &[String], sep: char) -> Result<Vec<(String, String)>, String> {
    items
        .iter()
        .map(|item| {
            item.split_once(sep)
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| item.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parsing() {
        let parsed = parse_pairs(&["run_anomaly=false".to_string()], '=').unwrap();
        assert_eq!(parsed, vec![("run_anomaly".to_string(), "false".to_string())]);
    }

    #[test]
    fn test_header_parsing() {
        let parsed = parse_pairs(&["Content-Type: application/json".to_string()], ':').unwrap();
        assert_eq!(
            parsed,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn test_malformed_pair_is_reported() {
        let err = parse_pairs(&["a=1".to_string(), "broken".to_string()], '=').unwrap_err();
        assert_eq!(err, "broken");
    }

    #[test]
    fn test_method_parsing() {
        for m in &["get", "GET", "Get", "post", "POST", "delete", "put", "patch"] {
            assert!(parse_method(m).is_some(), "Failed to parse method: {m}");
        }
        assert!(parse_method("FETCH").is_none());
    }
}
