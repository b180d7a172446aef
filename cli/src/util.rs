use serde_json::{Map, Value, json};

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Print a structured usage error and exit with code 4.
pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    print_json(&err, false, true);
    std::process::exit(4);
}

/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub fn exit_code_for_status(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

pub fn print_json(value: &Value, raw: bool, to_stderr: bool) {
    let formatted = if raw {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .unwrap_or_else(|_| value.to_string());

    if to_stderr {
        eprintln!("{formatted}");
    } else {
        println!("{formatted}");
    }
}

pub fn build_url(
    api_url: &str,
    path: &str,
    query: &[(String, String)],
) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(&format!("{}{path}", api_url.trim_end_matches('/')))
        .map_err(|e| format!("Invalid URL: {api_url}{path}: {e}"))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Send a request and read the body as JSON.
///
/// On a transport failure the error is printed and the connection exit
/// code (3) is returned as `Err`.
pub async fn send(req: reqwest::RequestBuilder) -> Result<(u16, Value), i32> {
    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "Request failed");
            print_json(
                &json!({
                    "error": "connection_error",
                    "message": format!("{e}"),
                    "docs_hint": "Is the API server running? Check AGENTFLOW_API_URL."
                }),
                false,
                true,
            );
            return Err(3);
        }
    };

    let status = resp.status().as_u16();
    tracing::debug!(status, "Response received");
    let body = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };
    Ok((status, body))
}

/// Send a request, print the JSON body and return the structured exit code.
/// Success bodies go to stdout, everything else to stderr.
pub async fn send_and_print(req: reqwest::RequestBuilder, raw: bool) -> i32 {
    match send(req).await {
        Ok((status, body)) => {
            let code = exit_code_for_status(status);
            print_json(&body, raw, code != 0);
            code
        }
        Err(code) => code,
    }
}

/// Execute an API request with an optional JSON body, print the response,
/// and return the structured exit code.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
    query: &[(String, String)],
    extra_headers: &[(String, String)],
    raw: bool,
) -> i32 {
    let url = match build_url(api_url, path, query) {
        Ok(u) => u,
        Err(e) => {
            print_json(&json!({"error": "cli_error", "message": e}), false, true);
            return 4;
        }
    };

    let mut req = client().request(method, url);
    for (k, v) in extra_headers {
        req = req.header(k.as_str(), v.as_str());
    }
    if let Some(b) = body {
        req = req.json(&b);
    }

    send_and_print(req, raw).await
}

/// Parse a JSON object passed on the command line (e.g. `--metadata`).
pub fn parse_json_object(raw: &str, flag: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!(
            "{flag} must be a JSON object, got {}",
            agentflow_core::normalize::json_type_name(&other)
        )),
        Err(e) => Err(format!("Invalid JSON in {flag}: {e}")),
    }
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<Value, String> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for_status(200), 0);
        assert_eq!(exit_code_for_status(204), 0);
        assert_eq!(exit_code_for_status(422), 1);
        assert_eq!(exit_code_for_status(429), 1);
        assert_eq!(exit_code_for_status(502), 2);
        assert_eq!(exit_code_for_status(301), 2);
    }

    #[test]
    fn test_build_url_with_query() {
        let url = build_url(
            "http://localhost:3000/",
            "/v1/agent/analyze",
            &[("run_dedup".to_string(), "false".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/v1/agent/analyze?run_dedup=false"
        );
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(build_url("not a url", "/health", &[]).is_err());
    }

    #[test]
    fn test_parse_json_object() {
        let map = parse_json_object(r#"{"source":"cli"}"#, "--metadata").unwrap();
        assert_eq!(map["source"], "cli");

        let err = parse_json_object("[1,2]", "--metadata").unwrap_err();
        assert_eq!(err, "--metadata must be a JSON object, got array");

        let err = parse_json_object("{oops", "--context").unwrap_err();
        assert!(err.starts_with("Invalid JSON in --context"));
    }

    #[test]
    fn test_read_json_from_missing_file() {
        let err = read_json_from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.contains("Failed to read file"));
    }
}
