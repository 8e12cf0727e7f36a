// civet: expression evaluator for a small C-like language

use std::fs;
use std::path::Path;

use civet::{Interpreter, Scalar};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        let program_name = args.get(0).map(|s| s.as_str()).unwrap_or("civet");
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("Usage: {} <file.c>", program_name);
        eprintln!();
        eprintln!("Examples:");
        eprintln!(
            "  {} expr.c                  # Evaluate a file of declarations and expressions",
            program_name
        );
        eprintln!(
            "  RUST_LOG=debug {} expr.c   # Same, with evaluator tracing",
            program_name
        );
        std::process::exit(1);
    }

    let input_file = &args[1];

    if !Path::new(input_file).exists() {
        eprintln!("Error: File '{}' not found", input_file);
        eprintln!(
            "Usage: {} <file.c>",
            args.get(0).map(|s| s.as_str()).unwrap_or("civet")
        );
        std::process::exit(1);
    }

    let source = match fs::read_to_string(input_file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Could not read '{}': {}", input_file, e);
            std::process::exit(1);
        }
    };

    let mut interpreter = Interpreter::default();
    match interpreter.run(&source, input_file) {
        Ok(Some(result)) => match result {
            Scalar::Fp(v) => println!("{}", v),
            Scalar::Pointer(addr) => println!("0x{:x}", addr),
            Scalar::UnsignedLong(v) => println!("{}", v),
            other => println!("{}", other.as_int()),
        },
        Ok(None) => {}
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
