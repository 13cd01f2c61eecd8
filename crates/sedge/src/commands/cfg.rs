//! Cfg command: dump every script region's control-flow graph as dot.

use sedge_analysis::cfg::Graph;
use sedge_analysis::queries::collect_captures;
use std::path::PathBuf;

pub fn cmd_cfg(file: &PathBuf) -> i32 {
    let mut engine = match super::build_engine() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            return 2;
        }
    };

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

    let scripts = collect_captures(
        &engine.queries().embedded_scripts,
        ctx.root(),
        &ctx.body,
        "script",
    );

    let mut dumped = 0;
    for script in scripts {
        // Expression-valued bindings have no statement graph.
        let is_block = script
            .named_child(0)
            .is_some_and(|c| c.kind() == "statement_block");
        if !is_block {
            continue;
        }

        match Graph::from_script(script) {
            Ok(graph) => {
                println!("// script region at {}", script.start_position().row);
                print!("{}", graph.to_dot(&ctx.body));
                dumped += 1;
            }
            Err(e) => eprintln!("skipping region at row {}: {e}", script.start_position().row),
        }
    }

    if dumped == 0 {
        eprintln!("no statement-block script regions in {name}");
    }
    0
}
