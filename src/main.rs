use anyhow::{anyhow, bail, Context};
use gif2png::{EncodeOptions, Encoder, Filter};
use log::info;
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

const USAGE: &str = "usage: gif2png [-f|--filter none|sub|up|average|paeth] [-p|--plays N] [-o|--output PATH] [INPUT]";

#[derive(Debug)]
struct Args {
    input: PathBuf,
    output: PathBuf,
    options: EncodeOptions,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = parse_args(env::args().skip(1))?;
    info!("Converting {:?} into {:?}", args.input, args.output);

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let image = gif2png::decode(BufReader::new(input))
        .with_context(|| format!("failed to decode {}", args.input.display()))?;
    info!(
        "Decoded {}x{} image with {} frame(s)",
        image.width,
        image.height,
        image.frames.len()
    );

    let output = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut output = BufWriter::new(output);
    Encoder::new(&mut output, args.options)
        .encode(&image)
        .with_context(|| format!("failed to encode {}", args.output.display()))?;
    output
        .flush()
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    Ok(())
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> anyhow::Result<Args> {
    let mut input = None;
    let mut output = None;
    let mut options = EncodeOptions::default();

    while let Some(arg) = args.next() {
        let mut next = || {
            args.next()
                .ok_or_else(|| anyhow!("missing value for {}\n{}", arg, USAGE))
        };

        match &*arg {
            "-f" | "--filter" => {
                options.filter = next()?.parse::<Filter>().map_err(|err| anyhow!(err))?
            }
            "-p" | "--plays" => options.plays = next()?.parse().context("invalid play count")?,
            "-o" | "--output" => output = Some(PathBuf::from(next()?)),
            "-h" | "--help" => {
                eprintln!("{}", USAGE);
                exit(0);
            }
            path if input.is_none() => input = Some(PathBuf::from(path)),
            path => bail!("unexpected argument {}\n{}", path, USAGE),
        }
    }

    let input = input.unwrap_or_else(|| PathBuf::from("test.gif"));
    let output = output.unwrap_or_else(|| change_extension(&input, "png"));
    Ok(Args {
        input,
        output,
        options,
    })
}

fn change_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}
