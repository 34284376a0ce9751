//! wikistore - a Git-backed wiki content store with full-text search
//!
//! This is the main entry point for the wikistore command-line interface.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use wikistore::config::WikiConfig;
use wikistore::service::ContentService;
use wikistore::store::PageTitle;

mod logger;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if let Err(e) = logger::Logger::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    // Parse simple command line args.
    let mut data_dir = PathBuf::from(".wiki");
    let mut index_dir: Option<PathBuf> = None;
    let mut remote: Option<String> = None;
    let mut push = false;
    let mut rest: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--data" => {
                i += 1;
                if i < args.len() {
                    data_dir = PathBuf::from(&args[i]);
                }
            }
            "--index-dir" => {
                i += 1;
                if i < args.len() {
                    index_dir = Some(PathBuf::from(&args[i]));
                }
            }
            "--remote" => {
                i += 1;
                if i < args.len() {
                    remote = Some(args[i].clone());
                }
            }
            "--push" => {
                push = true;
            }
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("wikistore v0.1.0");
                return ExitCode::SUCCESS;
            }
            arg => {
                if arg.starts_with('-') {
                    eprintln!("Unknown option: {}", arg);
                    return ExitCode::FAILURE;
                }
                rest.push(arg.to_string());
            }
        }
        i += 1;
    }

    if rest.is_empty() {
        print_help();
        return ExitCode::FAILURE;
    }

    let mut config = WikiConfig::new(&data_dir).push(push);
    if let Some(dir) = index_dir {
        config = config.index_dir(dir);
    }
    if let Some(url) = remote {
        config = config.remote(url);
    }

    let service = match ContentService::open(&config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error opening wiki at {}: {}", data_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run_command(&service, &rest) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(
    service: &ContentService,
    rest: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    match rest[0].as_str() {
        "view" => {
            let title = parse_title(rest.get(1))?;
            let page = service.read(&title)?;
            print!("{}", page.body_text());
            Ok(())
        }
        "save" => {
            let title = parse_title(rest.get(1))?;
            let body = match rest.get(2) {
                Some(file) => std::fs::read(file)?,
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin().read_to_end(&mut buf)?;
                    buf
                }
            };

            let receipt = service.save(&title, &body)?;
            println!("saved {} @ {}", title, receipt.revision.short());
            for warning in &receipt.warnings {
                eprintln!("warning: {}", warning);
            }
            Ok(())
        }
        "search" => {
            let query = rest
                .get(1..)
                .filter(|q| !q.is_empty())
                .ok_or("usage: search <query>")?
                .join(" ");
            let hits = service.search(&query);
            println!("{}", serde_json::to_string(&hits)?);
            Ok(())
        }
        "history" => {
            let title = parse_title(rest.get(1))?;
            for rev in service.history(&title, None)? {
                println!(
                    "{}  {}  {}  {}",
                    rev.id.short(),
                    rev.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    rev.author_name,
                    rev.summary()
                );
            }
            Ok(())
        }
        "reindex" => {
            let pages = service.rebuild_index()?;
            println!("indexed {} page(s)", pages);
            Ok(())
        }
        cmd => Err(format!("unknown command: {}", cmd).into()),
    }
}

fn parse_title(arg: Option<&String>) -> Result<PageTitle, Box<dyn std::error::Error>> {
    let raw = arg.ok_or("missing <title> argument")?;
    Ok(raw.parse::<PageTitle>()?)
}

fn print_help() {
    println!("wikistore - a Git-backed wiki content store");
    println!();
    println!("Usage: wikistore [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  view <title>          Print a page body");
    println!("  save <title> [FILE]   Save a page from FILE or stdin");
    println!("  search <query>        Full-text search, JSON output");
    println!("  history <title>       Commit history for a page");
    println!("  reindex               Rebuild the search index from the store");
    println!();
    println!("Options:");
    println!("  -d, --data PATH       Data root directory (default: .wiki)");
    println!("  --index-dir PATH      Search index directory (default: <data>/.index)");
    println!("  --remote URL          Git remote URL for origin");
    println!("  --push                Push each commit to the remote");
    println!("  -h, --help            Show this help message");
    println!("  --version             Show version");
    println!();
    println!("Examples:");
    println!("  wikistore -d ./wiki save FrontPage page.md");
    println!("  wikistore -d ./wiki search CamelCase");
}
