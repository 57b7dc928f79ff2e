use log::{Level, LevelFilter, Log, Metadata, Record};
use std::env;
use std::fs;
use std::process;

const USAGE: &str = "Usage: tablature [-v] encode <input.yaml> [output.musicxml]
       tablature [-v] decode <input.musicxml> [output.yaml]";

/// Writes log records to stderr
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn usage() -> ! {
    eprintln!("{}", USAGE);
    process::exit(1);
}

fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();

    // Parse flags
    if matches!(args.first().map(String::as_str), Some("-v" | "--verbose")) {
        args.remove(0);
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
    }

    if args.len() < 2 {
        usage();
    }
    let command = args[0].as_str();
    let input_path = &args[1];
    let output_path: Option<&String> = args.get(2);

    // Read input file
    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let (result, kind) = match command {
        "encode" => (
            tablature::parse_tab_file(&source)
                .map(|file| tablature::encode_with_options(&file.piece, &file.options)),
            "MusicXML",
        ),
        "decode" => (
            tablature::decode_document(&source)
                .and_then(|document| tablature::TabFile::from_document(document).to_yaml()),
            "tab file",
        ),
        _ => usage(),
    };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &output) {
                eprintln!("Error writing to '{}': {}", path, e);
                process::exit(1);
            }
            eprintln!("Wrote {} to {}", kind, path);
        }
        None => {
            print!("{}", output);
        }
    }
}
