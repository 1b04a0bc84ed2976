/// Audit a directory of HTML files and emit JSONL reports.
///
/// Usage:
///   cargo run --bin audit -- <html-dir> [target-keyword]
///
/// Output (stdout): one JSON object per file: {"file": "...", "report": {...}}
/// Errors (stderr): {"file": "...", "error": "..."}
/// Summary (stderr): "Done: N ok, M errors"
///
/// Runs without an AI collaborator: issues and scores are complete,
/// suggestions are simply absent.
use std::env;
use std::fs;
use std::path::Path;

use seolens::{analyze, AnalysisRequest, Config, NoCollaborator, RequestOptions};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: audit <html-dir> [target-keyword]");
        std::process::exit(1);
    }
    let html_dir = Path::new(&args[1]);
    let target_keyword = args.get(2).cloned();

    let config = Config::default();

    let mut entries: Vec<_> = fs::read_dir(html_dir)
        .expect("cannot read html-dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "html"))
        .map(|e| e.path())
        .collect();
    entries.sort();

    let mut ok = 0usize;
    let mut errors = 0usize;

    for path in &entries {
        let filename = path.file_name().unwrap().to_string_lossy().to_string();

        let content = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({"file": filename, "error": e.to_string()})
                );
                errors += 1;
                continue;
            }
        };

        let request = AnalysisRequest {
            content,
            content_type: "html".to_string(),
            config: RequestOptions {
                target_keyword: target_keyword.clone(),
                ..RequestOptions::default()
            },
        };

        match analyze(&request, &NoCollaborator, &config) {
            Ok(report) => {
                println!(
                    "{}",
                    serde_json::json!({"file": filename, "report": report})
                );
                ok += 1;
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({"file": filename, "error": e.to_string()})
                );
                errors += 1;
            }
        }
    }

    eprintln!("Done: {ok} ok, {errors} errors  (total {})", ok + errors);
}
