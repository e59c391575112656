use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use underdown_core::{TagState, Token, convert_to_html, convert_to_html_sanitized, parse};

fn main() {
    let mut input: Option<String> = None;
    let mut sanitized = false;
    let mut dump_tokens = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--sanitized" => sanitized = true,
            "--tokens" => dump_tokens = true,
            _ => {
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    print_usage();
                    process::exit(2);
                }
            }
        }
    }

    let source = match input {
        Some(path) => fs::read_to_string(&path).unwrap_or_else(|err| {
            eprintln!("failed to read {}: {}", path, err);
            process::exit(1);
        }),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .unwrap_or_else(|err| {
                    eprintln!("failed to read stdin: {}", err);
                    process::exit(1);
                });
            buffer
        }
    };

    if dump_tokens {
        dump_token_stream(&parse(&source));
    }

    let html = if sanitized {
        convert_to_html_sanitized(&source)
    } else {
        convert_to_html(&source)
    };

    println!("{}", html);
}

fn print_usage() {
    eprintln!("Usage: underdown-cli [--sanitized] [--tokens] [input]");
}

fn dump_token_stream(tokens: &[Token]) {
    for token in tokens {
        eprintln!("token {:?}", token.content);
        for marker in &token.markers {
            let state = match marker.state {
                TagState::Open => "open",
                TagState::Close => "close",
            };
            eprintln!("  {:?} {} at {}", marker.kind, state, marker.offset);
        }
    }
}
