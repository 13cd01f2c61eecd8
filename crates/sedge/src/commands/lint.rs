//! Lint command: run the default passes and print findings.

use nu_ansi_term::Color::{Cyan, Red, Yellow};
use sedge_lints::{CancelToken, Diagnostic, Severity, default_passes};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    diagnostics: &'a [Diagnostic],
}

/// Indent a context snippet: first line only, ellipsis when it spans more.
fn prepare_snippet(text: &str) -> String {
    let mut lines = text.lines().map(|l| l.trim_start());
    match (lines.next(), lines.next()) {
        (None, _) => String::new(),
        (Some(first), None) => format!("\t{first}"),
        (Some(first), Some(_)) => format!("\t{first}\n\t..."),
    }
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => Red.paint("error").to_string(),
        Severity::Warning => Yellow.paint("warning").to_string(),
        Severity::Info | Severity::Hint => Cyan.paint(severity.to_string()).to_string(),
    }
}

pub fn cmd_lint(files: &[PathBuf], no_plugin_dump: bool, json: bool) -> i32 {
    let mut engine = match super::build_engine() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            return 2;
        }
    };
    if no_plugin_dump {
        engine.set_plugin_dump(false);
    }

    let passes = default_passes();
    let cancel = CancelToken::new();
    let mut had_errors = false;
    let mut reports: Vec<(String, Vec<Diagnostic>)> = Vec::new();

    for file in files {
        let name = file.display().to_string();
        let body = match std::fs::read_to_string(file) {
            Ok(body) => body,
            Err(e) => {
                eprintln!("could not open file {name}: {e}");
                return 2;
            }
        };
        if let Err(e) = engine.ingest(&name, body) {
            eprintln!("could not analyse file {name}: {e}");
            return 2;
        }

        let ctx = match engine.get_context(&name) {
            Ok(ctx) => ctx,
            Err(e) => {
                eprintln!("{e}");
                return 2;
            }
        };

        let mut diags = Vec::new();
        for pass in &passes {
            diags.extend(pass.analyze(&name, ctx, &engine, &cancel));
        }
        had_errors |= diags.iter().any(|d| d.severity == Severity::Error);

        if json {
            reports.push((name, diags));
        } else {
            print_text(file, ctx.body.as_str(), &diags);
        }
    }

    if json {
        let out: Vec<FileReport> = reports
            .iter()
            .map(|(file, diagnostics)| FileReport {
                file: file.clone(),
                diagnostics,
            })
            .collect();
        match serde_json::to_string_pretty(&out) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("failed to serialize diagnostics: {e}");
                return 2;
            }
        }
    }

    if had_errors { 1 } else { 0 }
}

fn print_text(file: &Path, body: &str, diags: &[Diagnostic]) {
    for diag in diags {
        println!(
            "{}\t{}\t{}: {} ({})",
            diag.range,
            file.display(),
            severity_label(diag.severity),
            diag.message,
            diag.source,
        );
        if let Some(context) = diag.context {
            let snippet = &body[context.start_byte..context.end_byte.min(body.len())];
            println!("\n{}\n", prepare_snippet(snippet));
        }
    }
}
