use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::info;

use rusty_align::alignment::{
    AlgorithmRegistry, AlignmentError, AlignmentOptions, ApplyGivenTransformation, MapAlignment,
};
use rusty_align::data::loader::{self, TransformationFiles};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "rusty-align", version, about)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Correct spectra of .parquet / .json runs.
    Experiments(ApplyArgs),
    /// Correct .json feature maps, including hulls and subordinates.
    Features(ApplyArgs),
    /// Correct .json identification runs.
    Identifications(ApplyArgs),
    /// List registered alignment algorithms.
    Algorithms,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Transformation file (.json or .csv), once per input, in input order.
    #[arg(short = 't', long = "trafo", required = true)]
    pub trafos: Vec<PathBuf>,

    /// Directory the corrected runs are written to, under their input names.
    #[arg(short, long)]
    pub output_dir: PathBuf,

    #[arg(long, default_value = ApplyGivenTransformation::PRODUCT_NAME)]
    pub algorithm: String,

    /// Correct independent runs in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Input runs.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Experiments(args) => {
            let (algorithm, outputs) = prepare(&args)?;
            let mut runs = load_all(&args.inputs, loader::load_experiment)?;
            algorithm.align_experiments(&mut runs)?;
            for (run, out) in runs.iter().zip(&outputs) {
                loader::write_experiment(out, run)?;
            }
        }
        Command::Features(args) => {
            let (algorithm, outputs) = prepare(&args)?;
            let mut maps = load_all(&args.inputs, loader::load_feature_map)?;
            algorithm.align_feature_maps(&mut maps)?;
            for (map, out) in maps.iter().zip(&outputs) {
                loader::write_feature_map(out, map)?;
            }
        }
        Command::Identifications(args) => {
            let (algorithm, outputs) = prepare(&args)?;
            let mut runs = load_all(&args.inputs, loader::load_identifications)?;
            algorithm.align_identifications(&mut runs)?;
            for (ids, out) in runs.iter().zip(&outputs) {
                loader::write_identifications(out, ids)?;
            }
        }
        Command::Algorithms => {
            for name in AlgorithmRegistry::global().names() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

/// Check the pairing, build the algorithm and work out output paths, all
/// before any run is read.
fn prepare(args: &ApplyArgs) -> Result<(Box<dyn MapAlignment>, Vec<PathBuf>)> {
    if args.inputs.len() != args.trafos.len() {
        return Err(AlignmentError::SizeMismatch {
            collections: args.inputs.len(),
            transformations: args.trafos.len(),
        }
        .into());
    }

    let outputs = output_paths(&args.inputs, &args.output_dir)?;

    let provider = TransformationFiles(args.trafos.clone());
    let options = AlignmentOptions {
        parallel: args.parallel,
    };
    let algorithm = AlgorithmRegistry::global().create(&args.algorithm, &provider, options)?;
    info!(
        "Aligning {} runs with '{}'",
        args.inputs.len(),
        algorithm.name()
    );

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;
    Ok((algorithm, outputs))
}

fn output_paths(inputs: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    // A missing output directory cannot hold any input.
    let resolved_dir = fs::canonicalize(output_dir).ok();
    let mut outputs: Vec<PathBuf> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = input
            .file_name()
            .with_context(|| format!("{} has no file name", input.display()))?;
        let out = output_dir.join(name);
        if let (Some(dir), Ok(resolved_input)) = (&resolved_dir, fs::canonicalize(input)) {
            if dir.join(name) == resolved_input {
                bail!("{} would overwrite its own input", out.display());
            }
        }
        if outputs.contains(&out) {
            bail!("two inputs would both be written to {}", out.display());
        }
        outputs.push(out);
    }
    Ok(outputs)
}

fn load_all<T>(inputs: &[PathBuf], load: fn(&Path) -> Result<T>) -> Result<Vec<T>> {
    inputs
        .iter()
        .map(|p| load(p).with_context(|| format!("loading {}", p.display())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_trafos() {
        let cli = Cli::try_parse_from([
            "rusty-align",
            "features",
            "-t",
            "a.csv",
            "--trafo",
            "b.json",
            "-o",
            "out",
            "a.json",
            "b.json",
        ])
        .unwrap();
        let Command::Features(args) = cli.command else {
            panic!("expected features");
        };
        assert_eq!(args.trafos, vec![PathBuf::from("a.csv"), PathBuf::from("b.json")]);
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.algorithm, "apply_given_trafo");
        assert!(!args.parallel);
    }

    #[test]
    fn mismatch_fails_before_loading() {
        let cli = Cli::try_parse_from([
            "rusty-align",
            "experiments",
            "-t",
            "missing.csv",
            "-o",
            "out",
            "one.parquet",
            "two.parquet",
        ])
        .unwrap();
        let Command::Experiments(args) = cli.command else {
            panic!("expected experiments");
        };
        let err = prepare(&args).err().unwrap();
        assert!(err.to_string().contains("2 collections but 1 transformations"));
    }

    #[test]
    fn refuses_to_overwrite_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let runs = tmp.path().join("runs");
        fs::create_dir(&runs).unwrap();
        fs::write(runs.join("a.json"), "[]").unwrap();

        let inputs = vec![runs.join("a.json")];
        assert!(output_paths(&inputs, &runs).is_err());

        let aligned = tmp.path().join("aligned");
        assert_eq!(
            output_paths(&inputs, &aligned).unwrap(),
            vec![aligned.join("a.json")]
        );
    }

    #[test]
    fn spelling_of_the_input_path_does_not_matter() {
        let tmp = tempfile::tempdir().unwrap();
        let runs = tmp.path().join("runs");
        fs::create_dir(&runs).unwrap();
        fs::write(runs.join("a.json"), "[]").unwrap();

        let roundabout = runs.join("..").join("runs").join("a.json");
        let err = output_paths(&[roundabout], &runs).unwrap_err();
        assert!(err.to_string().contains("would overwrite its own input"));
    }
}
