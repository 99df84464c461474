//! Headless odds sampler.
//!
//! Draws a batch of crash points and prints the empirical survival curve
//! against the analytic one, useful for eyeballing the house edge after
//! tuning the generator.

use clap::Parser;
use crashlab::engine::{CrashPointGenerator, OsEntropy};

#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Sample crash points and report the survival curve", long_about = None)]
struct Args {
    /// Number of rounds to draw
    #[arg(long, default_value = "100000")]
    rounds: usize,

    /// Multiplier floor
    #[arg(long, default_value = "1.10")]
    floor: f64,
}

fn main() {
    let args = Args::parse();

    let mut generator = CrashPointGenerator::with_floor(OsEntropy, args.floor);
    let draws: Vec<f64> = (0..args.rounds).map(|_| generator.draw()).collect();

    let mean = draws.iter().sum::<f64>() / draws.len() as f64;
    let max = draws.iter().cloned().fold(f64::MIN, f64::max);

    println!("rounds: {}", args.rounds);
    println!("mean crash point: {:.4}", mean);
    println!("max crash point:  {:.2}", max);
    println!();
    println!("{:>10}  {:>10}  {:>10}", "reach", "empirical", "analytic");

    for target in [1.5, 2.0, 3.0, 5.0, 10.0, 20.0, 50.0, 100.0] {
        let survived = draws.iter().filter(|&&c| c >= target).count();
        let empirical = survived as f64 / draws.len() as f64;
        // P(crash >= x) = 99 / (100x - 1), ~0.99/x for large x.
        let analytic = 99.0 / (100.0 * target - 1.0);
        println!(
            "{:>9}x  {:>10.5}  {:>10.5}",
            target, empirical, analytic
        );
    }
}
