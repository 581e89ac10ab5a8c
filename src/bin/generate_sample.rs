use std::path::Path;

use anyhow::{Context, Result};
use rusty_align::data::loader::write_experiment;
use rusty_align::data::model::{Experiment, MetadataValue, Spectrum};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Retention time at which the drifted run records what the reference saw at `rt`.
fn drift(rt: f64) -> f64 {
    1.015 * rt + 4.0 + 2.5 * (rt / 180.0).sin()
}

/// Analytes as (m/z, elution apex in reference seconds, peak width, height).
const ANALYTES: [(f64, f64, f64, f64); 4] = [
    (445.12, 120.0, 6.0, 1.0e6),
    (512.27, 260.0, 8.0, 4.0e5),
    (622.03, 410.0, 5.0, 7.5e5),
    (785.84, 530.0, 9.0, 2.0e5),
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // Reference cycle: one MS1 scan per second for ten minutes.
    let spectra: Vec<Spectrum> = (0..600)
        .map(|i| {
            let reference_rt = i as f64;
            let mut spectrum = Spectrum::at(drift(reference_rt));
            for &(mz, apex, width, height) in &ANALYTES {
                let signal = gaussian(reference_rt, apex, width, height);
                let noise = rng.gauss(0.0, 50.0).abs();
                spectrum.mz.push(mz + rng.gauss(0.0, 0.002));
                spectrum.intensity.push(signal + noise);
            }
            spectrum
                .metadata
                .insert("scan".to_string(), MetadataValue::Integer(i as i64 + 1));
            spectrum
        })
        .collect();
    let run = Experiment::from_spectra(spectra);

    let run_path = Path::new("sample_run.parquet");
    write_experiment(run_path, &run)?;

    // Knots mapping drifted retention times back onto the reference.
    let trafo_path = Path::new("sample_trafo.csv");
    let mut writer = csv::Writer::from_path(trafo_path).context("creating trafo CSV")?;
    writer.write_record(["x", "y"])?;
    for reference_rt in (0..=600).step_by(30) {
        let reference_rt = reference_rt as f64;
        writer.write_record([drift(reference_rt).to_string(), reference_rt.to_string()])?;
    }
    writer.flush()?;

    println!(
        "Wrote {} spectra to {} and correcting knots to {}",
        run.len(),
        run_path.display(),
        trafo_path.display()
    );
    Ok(())
}
