//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions. The CLI is a wrapper: the refactoring engine
//! itself has no file or terminal surface.

use std::{path::PathBuf, process};

use clap::{Parser, Subcommand};

use crate::{
    errors::SourceContext,
    extract::extract,
    parser, printer,
    syntax::{Position, Primitive, Range, SyntaxTree, TypeNode},
    HoistError,
};

// ============================================================================
// CLI ARGUMENTS - Command-line argument definitions
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "hoist",
    version,
    about = "An extract-to-variable refactoring engine for a Java-like language."
)]
pub struct HoistArgs {
    #[command(subcommand)]
    pub command: ArgsCommand,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Parse a method and reprint it in canonical form.
    Format {
        /// The path to the file holding the method declaration.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Show the syntax tree for a method as JSON.
    Ast {
        /// The path to the file holding the method declaration.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Extract the expression at a source range into a new local variable.
    Extract {
        /// The path to the file holding the method declaration.
        #[arg(required = true)]
        file: PathBuf,
        /// Expression range as LINE:COL-LINE:COL (1-indexed, end inclusive).
        #[arg(long)]
        range: String,
        /// Name for the new variable.
        #[arg(long)]
        name: String,
        /// Declared type for the new variable.
        #[arg(long = "type")]
        ty: String,
    },
}

// ============================================================================
// MAIN ENTRY POINT - Direct engine calls
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = HoistArgs::parse();

    match args.command {
        ArgsCommand::Format { file } => {
            let tree = parse_file_or_exit(&file);
            println!("{}", printer::print(&tree));
        }

        ArgsCommand::Ast { file } => {
            let tree = parse_file_or_exit(&file);
            match serde_json::to_string_pretty(&tree) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: could not serialize the tree: {}", e);
                    process::exit(1);
                }
            }
        }

        ArgsCommand::Extract {
            file,
            range,
            name,
            ty,
        } => {
            let range = parse_range_or_exit(&range);
            let mut tree = parse_file_or_exit(&file);
            let ty = match Primitive::from_str(&ty) {
                Some(p) => TypeNode::Primitive(p),
                None => TypeNode::Named(ty),
            };
            if extract(&mut tree, range, &name, ty) {
                println!("{}", printer::print(&tree));
            } else {
                eprintln!("no extractable expression at the requested range");
                process::exit(1);
            }
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn read_file_or_exit(path: &PathBuf) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: could not read {}: {}", path.display(), e);
        process::exit(1);
    })
}

fn parse_file_or_exit(path: &PathBuf) -> SyntaxTree {
    let source = read_file_or_exit(path);
    let ctx = SourceContext::from_file(path.display().to_string(), source.clone());
    parser::parse_method(&source, ctx).unwrap_or_else(|e| {
        print_error(e);
        process::exit(1);
    })
}

fn print_error(error: HoistError) {
    eprintln!("{:?}", miette::Report::new(error));
}

/// Parses `LINE:COL-LINE:COL` into a [`Range`].
fn parse_range_or_exit(text: &str) -> Range {
    fn position(text: &str) -> Option<Position> {
        let (line, column) = text.split_once(':')?;
        Some(Position::new(line.parse().ok()?, column.parse().ok()?))
    }
    let parsed = text
        .split_once('-')
        .and_then(|(begin, end)| Some(Range::new(position(begin)?, position(end)?)));
    parsed.unwrap_or_else(|| {
        eprintln!("error: range must look like 2:35-2:46, got {:?}", text);
        process::exit(1);
    })
}
