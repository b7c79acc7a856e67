//! Print the SHA-256 pin of a model artifact.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin model_digest -- <artifact.json> [--layout standard|with_bmi] [--check]
//! ```
//!
//! The digest goes to stdout so it can be fed straight into
//! `CARDIOCARE_MODEL_SHA256`. With `--check` the artifact is also loaded and
//! validated against the chosen feature layout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use cardiocare::adapters::model::artifact_digest;
use cardiocare::adapters::{JsonModelClassifier, ModelSpec};
use cardiocare::domain::FeatureLayout;

const USAGE: &str = "Usage: model_digest <artifact.json> [--layout standard|with_bmi] [--check]";

struct Args {
    path: PathBuf,
    layout: FeatureLayout,
    check: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    let mut layout = FeatureLayout::Standard;
    let mut check = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--layout" => {
                let value = args.next().context(USAGE)?;
                layout = value.parse().map_err(anyhow::Error::msg)?;
            }
            "--check" => check = true,
            "-h" | "--help" => bail!(USAGE),
            other if other.starts_with("--") => bail!("unknown flag {other}\n{USAGE}"),
            other => path = Some(PathBuf::from(other)),
        }
    }

    Ok(Args {
        path: path.context(USAGE)?,
        layout,
        check,
    })
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let digest = artifact_digest(&args.path)
        .with_context(|| format!("cannot digest {}", args.path.display()))?;

    if args.check {
        let spec = ModelSpec::new(&args.path, args.layout).with_sha256(digest.clone());
        let model = JsonModelClassifier::load(&spec)
            .with_context(|| format!("{} failed validation", args.path.display()))?;
        eprintln!(
            "ok: '{}' matches the {} layout ({} features)",
            model.name(),
            args.layout,
            args.layout.len()
        );
    }

    println!("{digest}");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(2)
        }
    }
}
