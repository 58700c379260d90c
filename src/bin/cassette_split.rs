//! Splits a recorded session cassette into one cassette per port.
//!
//! Usage: `cassette_split <session.cassette.yaml> <output_dir>`
//!
//! Each port gets `<output_dir>/<port>.cassette.yaml` with sequence numbers
//! restarted at 0, ready to be replayed on its own through
//! `CassetteConfig`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::{env, fs, process};

use task_wizard::cassette::format::Cassette;

fn split_cassette(input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, String> {
    let cassette = Cassette::load(input)?;
    let ports: BTreeSet<&str> = cassette.interactions.iter().map(|i| i.port.as_str()).collect();

    fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create {}: {e}", output_dir.display()))?;

    let mut written = Vec::new();
    for port in ports {
        let mut per_port = cassette.for_port(port);
        for (seq, interaction) in (0_u64..).zip(per_port.interactions.iter_mut()) {
            interaction.seq = seq;
        }

        let file_path = output_dir.join(format!("{port}.cassette.yaml"));
        let yaml = serde_yaml::to_string(&per_port)
            .map_err(|e| format!("Failed to serialize cassette for port {port}: {e}"))?;
        fs::write(&file_path, yaml)
            .map_err(|e| format!("Failed to write {}: {e}", file_path.display()))?;
        written.push(file_path);
    }
    Ok(written)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: cassette_split <session.cassette.yaml> <output_dir>");
        process::exit(1);
    }

    match split_cassette(Path::new(&args[1]), Path::new(&args[2])) {
        Ok(written) => {
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
