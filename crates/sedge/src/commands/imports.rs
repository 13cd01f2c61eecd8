//! Imports command: list importable modules under the search paths.

use sedge_analysis::resolve;
use serde::Serialize;

#[derive(Serialize)]
struct ImportLine {
    url: String,
    major: i64,
    minor: i64,
}

pub fn cmd_imports(json: bool) -> i32 {
    let paths = match super::search_paths() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{e}");
            return 2;
        }
    };

    let (imports, minors) = resolve::possible_imports(&paths);
    let mut lines: Vec<ImportLine> = imports
        .into_iter()
        .map(|import| {
            let minor = minors.get(&import).copied().unwrap_or(0);
            ImportLine {
                url: import.url,
                major: import.major,
                minor,
            }
        })
        .collect();
    lines.sort_by(|a, b| a.url.cmp(&b.url).then(a.major.cmp(&b.major)));

    if json {
        match serde_json::to_string_pretty(&lines) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("failed to serialize imports: {e}");
                return 2;
            }
        }
    } else {
        for line in &lines {
            println!("{} {}.{}", line.url, line.major, line.minor);
        }
    }

    0
}
