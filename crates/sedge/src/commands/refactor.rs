//! Refactor command: apply a manifest's rewrites to files.

use sedge_refactor::RefactorManifest;
use std::path::PathBuf;

pub fn cmd_refactor(manifest_path: &PathBuf, files: &[PathBuf], write: bool) -> i32 {
    let manifest_src = match std::fs::read_to_string(manifest_path) {
        Ok(src) => src,
        Err(e) => {
            eprintln!("could not open manifest {}: {e}", manifest_path.display());
            return 2;
        }
    };
    let manifest =
        match RefactorManifest::load(&manifest_path.display().to_string(), &manifest_src) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("{e}");
                return 2;
            }
        };

    let mut engine = match super::build_engine() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            return 2;
        }
    };

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

        if let Err(e) = manifest.execute(&name, &mut engine) {
            eprintln!("refactoring failed for {name}: {e}");
            return 1;
        }

        let rewritten = match engine.get_context(&name) {
            Ok(ctx) => ctx.body.clone(),
            Err(e) => {
                eprintln!("{e}");
                return 2;
            }
        };

        if write {
            if let Err(e) = std::fs::write(file, &rewritten) {
                eprintln!("could not write {name}: {e}");
                return 2;
            }
        } else {
            print!("{rewritten}");
        }
    }

    0
}
