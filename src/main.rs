use std::{env, fs, path::PathBuf, process::ExitCode, sync::Arc};

use dotenv::dotenv;

use wikitree::wikitext::{SiteTraits, StaticTraits, WikiText, WtError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Inspect,
    Text,
    Json,
    Sections,
}

const USAGE: &str = "usage: wikitree <file> [--text | --json | --sections]";

/// Site configuration from the siteinfo JSON named by `WIKITREE_SITEINFO`,
/// or the English defaults.
fn load_traits() -> Result<StaticTraits, WtError> {
    match env::var("WIKITREE_SITEINFO") {
        Ok(path) => {
            log::debug!("loading siteinfo from {}", path);
            let json = fs::read_to_string(&path)
                .map_err(|e| WtError::io_err(format!("reading {}", path), e))?;
            StaticTraits::from_siteinfo_json(&json)
        }
        Err(_) => Ok(StaticTraits::default()),
    }
}

fn run(path: &PathBuf, output: Output) -> Result<(), WtError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| WtError::io_err(format!("reading {:?}", path), e))?;
    let traits: Arc<dyn SiteTraits> = Arc::new(load_traits()?);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let page = WikiText::with_traits(&raw, traits).with_page_name(name);

    if let Some(target) = page.redirect() {
        println!("redirect -> {}", target);
    }

    let doc = page.document()?;
    match output {
        Output::Inspect => print!("{}", doc.inspect(doc.root())),
        Output::Text => print!("{}", doc.text(doc.root())),
        Output::Json => println!("{}", doc.to_json(doc.root())?),
        Output::Sections => {
            for section in doc.sections() {
                println!("{} {}", "=".repeat(section.level() as usize), section.title(doc));
                for sub in section.subsections(doc) {
                    println!("  {} {}", "=".repeat(sub.level() as usize), sub.title(doc));
                }
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    dotenv().ok();

    let mut path = None;
    let mut output = Output::Inspect;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--text" => output = Output::Text,
            "--json" => output = Output::Json,
            "--sections" => output = Output::Sections,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return ExitCode::SUCCESS;
            }
            _ => path = Some(PathBuf::from(arg)),
        }
    }
    let Some(path) = path else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    match run(&path, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{} ({})", e, e.kind());
            ExitCode::FAILURE
        }
    }
}
