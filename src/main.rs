//! Build Forge CLI - Run build searches from JSON options.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;

use build_forge::{
    compute::search::{BuildSearch, SearchProgress},
    schema::{Catalog, SearchOptions},
};

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <options.json> [--catalog <catalog.json>] [--output <out.json>]",
        program
    );
    eprintln!();
    eprintln!("Search character builds described by a JSON options file.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  options.json  Path to search options");
    eprintln!("  --catalog     Catalog file (default: builtin catalog)");
    eprintln!("  --output      Write the records as JSON instead of printing them");
    eprintln!();
    eprintln!("Example options are generated with --example flag.");
}

fn print_example_options() {
    let json = serde_json::to_string_pretty(&SearchOptions::example())
        .unwrap_or_else(|e| fail("Error serializing example", e));
    println!("{}", json);
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, error);
    std::process::exit(1);
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_options();
        return;
    }

    let options_path = PathBuf::from(&args[1]);
    let mut catalog_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;

    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        let target = match flag.as_str() {
            "--catalog" => &mut catalog_path,
            "--output" => &mut output_path,
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        };
        match rest.next() {
            Some(value) => *target = Some(PathBuf::from(value)),
            None => fail("Missing value for", flag),
        }
    }

    // Load options
    let options_str = fs::read_to_string(&options_path)
        .unwrap_or_else(|e| fail("Error reading options file", e));
    let options: SearchOptions = serde_json::from_str(&options_str)
        .unwrap_or_else(|e| fail("Error parsing options", e));

    // Load catalog
    let catalog = match &catalog_path {
        Some(path) => Catalog::load(path).unwrap_or_else(|e| fail("Error loading catalog", e)),
        None => Catalog::builtin(),
    };

    println!("Build Forge Search");
    println!("==================");
    println!("Character: {}", options.character);
    println!("Equipment search: {}", options.equipment_search.name());
    if !options.sort.is_empty() {
        println!("Ranking by: {}", options.sort.join(", "));
    }
    println!();

    let search = BuildSearch::standard(&catalog);
    let mut next_report = 1000;
    let result = search
        .run_with_callback(&options, |progress: &SearchProgress| {
            if progress.candidates_evaluated >= next_report {
                println!(
                    "  {} candidates, {} builds, {} kept",
                    progress.candidates_evaluated, progress.builds_evaluated, progress.retained
                );
                next_report *= 10;
            }
        })
        .unwrap_or_else(|e| fail("Search failed", e));

    match &output_path {
        Some(path) => {
            let json = serde_json::to_string_pretty(&result)
                .unwrap_or_else(|e| fail("Error serializing results", e));
            fs::write(path, json).unwrap_or_else(|e| fail("Error writing results", e));
            println!("Wrote {} records to {}", result.records.len(), path.display());
        }
        None => {
            for record in &result.records {
                match record.fitness {
                    Some(fitness) => println!("{:+.4}  {}", fitness, record.label),
                    None => println!("{}", record.label),
                }
                for level in &record.levels {
                    let values: Vec<String> = level
                        .values
                        .iter()
                        .map(|(name, value)| format!("{}={:.2}", name, value))
                        .collect();
                    println!("    L{:<2} {}", level.level, values.join(" "));
                }
            }
        }
    }

    println!();
    println!(
        "Evaluated {} candidates ({} builds) in {:.2}s, kept {}",
        result.stats.candidates,
        result.stats.builds,
        result.stats.elapsed_seconds,
        result.stats.retained
    );
}
