use std::path::{Path, PathBuf};

use clap::Args;

use crate::util::{build_url, client, exit_error, send_and_print};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// File to classify (csv, xlsx, xls, pdf, docx, txt)
    pub file: PathBuf,

    /// Disable tabular anomaly detection
    #[arg(long)]
    pub no_anomaly: bool,

    /// Disable tabular dedup/standardization
    #[arg(long)]
    pub no_dedup: bool,

    /// Skip pretty-printing (raw JSON for piping)
    #[arg(long)]
    pub raw: bool,
}

pub async fn run(api_url: &str, args: AnalyzeArgs) -> i32 {
    let file_name = upload_name(&args.file).unwrap_or_else(|| {
        exit_error(
            &format!("Cannot derive a file name from '{}'", args.file.display()),
            Some("Pass a path to a regular file"),
        )
    });
    let bytes = std::fs::read(&args.file).unwrap_or_else(|e| {
        exit_error(
            &format!("Failed to read file '{}': {e}", args.file.display()),
            None,
        )
    });

    let url = match build_url(api_url, "/v1/agent/analyze", &analyzer_query(&args)) {
        Ok(u) => u,
        Err(e) => exit_error(&e, Some("Check --api-url / AGENTFLOW_API_URL")),
    };

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(bytes).file_name(file_name),
    );
    send_and_print(client().post(url).multipart(form), args.raw).await
}

fn upload_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

fn analyzer_query(args: &AnalyzeArgs) -> Vec<(String, String)> {
    vec![
        ("run_anomaly".to_string(), (!args.no_anomaly).to_string()),
        ("run_dedup".to_string(), (!args.no_dedup).to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_name_is_basename() {
        assert_eq!(
            upload_name(Path::new("/tmp/reports/ledger.csv")).as_deref(),
            Some("ledger.csv")
        );
        assert_eq!(upload_name(Path::new("/")), None);
    }

    #[test]
    fn test_analyzer_flags_become_query() {
        let args = AnalyzeArgs {
            file: PathBuf::from("ledger.csv"),
            no_anomaly: false,
            no_dedup: true,
            raw: false,
        };
        assert_eq!(
            analyzer_query(&args),
            vec![
                ("run_anomaly".to_string(), "true".to_string()),
                ("run_dedup".to_string(), "false".to_string()),
            ]
        );
    }
}
