use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::info;

use cpq::vm::Vm;
use cpq::{compile_file, listing_path, Options};

/// Compile CPL programs to quad listings.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The `.ou` file to compile
    #[clap(value_parser)]
    file: PathBuf,

    /// Where to write the listing, instead of next to the source as `.qud`
    #[clap(short, long, value_parser)]
    output: Option<PathBuf>,

    /// Print the listing instead of writing it
    #[clap(long, conflicts_with = "output")]
    stdout: bool,

    /// Keep jumps to the next line
    #[clap(long)]
    no_optimize: bool,

    /// Execute the listing, reading input tokens from stdin
    #[clap(long)]
    run: bool,

    /// More log output; repeat for more
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cpq::log::init(args.verbose);

    let options = Options {
        optimize: !args.no_optimize,
    };
    let compilation = compile_file(&args.file, &options)?;

    if args.run {
        let mut stdin = String::new();
        std::io::stdin()
            .read_to_string(&mut stdin)
            .context("failed to read stdin")?;
        let outcome = Vm::new(&compilation.code)
            .with_input(stdin.split_whitespace())
            .run()?;
        for value in outcome.output {
            println!("{value}");
        }
    } else if args.stdout {
        print!("{}", compilation.listing());
    } else {
        let path = args.output.unwrap_or_else(|| listing_path(&args.file));
        std::fs::write(&path, compilation.listing())
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    Ok(())
}
