//! One-shot QA from the terminal: ingest files or directories, ask one question.
//!
//! Usage: docqa-ask <path>... -- <question>

use std::path::PathBuf;
use std::{env, fs};

use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use docqa_core::config::Config;
use docqa_core::types::UploadedFile;
use docqa_rag::AskResponse;
use docqa_server::{build_service, init_tracing, is_candidate_file};

fn parse_args() -> (Vec<PathBuf>, String) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    let Some(split) = args.iter().position(|a| a == "--") else {
        eprintln!("Usage: {} <path>... -- <question>", prog); std::process::exit(1);
    };
    let question = args[split + 1..].join(" ");
    let paths: Vec<PathBuf> = args[..split].iter().map(PathBuf::from).collect();
    if paths.is_empty() || question.trim().is_empty() { eprintln!("Usage: {} <path>... -- <question>", prog); std::process::exit(1); }
    (paths, question)
}

/// Expand directories into the supported files beneath them, sorted per directory.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() { files.push(path.clone()); continue; }
        let mut found: Vec<PathBuf> = WalkDir::new(path).into_iter().filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(is_candidate_file))
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (paths, question) = parse_args();

    let files = collect_files(&paths);
    if files.is_empty() { anyhow::bail!("no supported files found"); }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?.progress_chars("#>-"));
    let mut uploads = Vec::with_capacity(files.len());
    for path in &files {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        pb.set_message(name.clone());
        uploads.push(UploadedFile::new(name, fs::read(path)?));
        pb.inc(1);
    }
    pb.finish_with_message("read");

    let service = build_service(&settings)?;
    let report = service.ingest(uploads).await?;
    println!("{} ({} chunks)", report.message(), report.chunks);
    if !report.skipped.is_empty() { println!("⚠️  Skipped: {}", report.skipped.join(", ")); }

    match service.ask(Some(&question)).await? {
        AskResponse::Answered(answer) => {
            println!("\n{}\n", answer.text);
            println!("confidence: {:.2} ({:?})", answer.confidence, answer.source);
            println!("context: {}", answer.context);
        }
        AskResponse::NoDocuments { answer } => println!("{}", answer),
    }
    Ok(())
}
