use std::f64::consts::PI;
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rusty_fts::analysis::spectrum::{DOUBLE_PASS_PATH_FACTOR, SPEED_OF_LIGHT_CM_PER_S};
use rusty_fts::sweep::{SweepPlan, DEFAULT_COUNTS_PER_MM};

/// Narrow source lines: (frequency GHz, amplitude).
const LINES: [(f64, f64); 3] = [(150.0, 0.6), (320.0, 0.35), (610.0, 0.2)];

/// Broadband component: (centre GHz, 1/e half-width GHz, amplitude).
const BAND: (f64, f64, f64) = (400.0, 150.0, 1.0);

/// Detector signal at path-length difference `x_cm`.
fn interferogram(x_cm: f64, rng: &mut SimpleRng) -> f64 {
    // DCT bin phase: π · path_factor · f · x / c
    let phase_per_ghz = PI * DOUBLE_PASS_PATH_FACTOR * x_cm * 1e9 / SPEED_OF_LIGHT_CM_PER_S;

    let lines: f64 = LINES
        .iter()
        .map(|&(f, a)| a * (phase_per_ghz * f).cos())
        .sum();

    // Gaussian band → Gaussian envelope around the white-light fringe
    let (f0, width, amp) = BAND;
    let envelope = (-(phase_per_ghz * width / 2.0).powi(2)).exp();
    let band = amp * envelope * (phase_per_ghz * f0).cos();

    let drift = 0.05 + 0.004 * x_cm;
    lines + band + drift + rng.gauss(0.0, 0.002)
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
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_text(path: &str, positions_cm: &[f64], visibility: &[f64]) -> Result<()> {
    let mut out = String::new();
    writeln!(out, "Note: synthetic lines at 150, 320 and 610 GHz over a 400 GHz band")?;
    writeln!(out, "Generator: generate_sample")?;
    writeln!(out)?;
    for (x, y) in positions_cm.iter().zip(visibility) {
        writeln!(out, "{x:.6} {y:.8}")?;
    }
    std::fs::write(path, out).with_context(|| format!("writing {path}"))
}

fn write_archive(path: &str, counts: Vec<i64>, r: Vec<f64>) -> Result<()> {
    let theta = vec![0.0; r.len()];
    let schema = Arc::new(Schema::new(vec![
        Field::new("position", DataType::Int64, false),
        Field::new("r", DataType::Float64, false),
        Field::new("theta", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(counts)),
            Arc::new(Float64Array::from(r)),
            Arc::new(Float64Array::from(theta)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    // 2 GHz resolution up to 2 THz, starting 10 mm before the fringe
    let plan = SweepPlan::new(2.0, 2000.0, -10.0, DEFAULT_COUNTS_PER_MM)?;
    let counts_per_cm = DEFAULT_COUNTS_PER_MM * 10.0;

    let counts: Vec<i64> = plan.positions().collect();
    let positions_cm: Vec<f64> = counts.iter().map(|&c| c as f64 / counts_per_cm).collect();
    let visibility: Vec<f64> = positions_cm
        .iter()
        .map(|&x| interferogram(x, &mut rng))
        .collect();

    write_text("sample_scan.txt", &positions_cm, &visibility)?;
    write_archive("sample_scan.parquet", counts, visibility)?;

    println!(
        "Wrote {} samples ({:.3} mm steps, {:.1} mm to {:.1} mm) to sample_scan.txt and sample_scan.parquet",
        positions_cm.len(),
        plan.step_mm,
        plan.start_mm,
        plan.end_mm
    );
    Ok(())
}
