extern crate lagrange_decision;
use indicatif::ProgressIterator;
use lagrange_decision::*;
use std::time::Instant;

macro_rules! time {
    ($x:expr) => {{
        let start = Instant::now();
        $x;
        let end = start.elapsed();
        end.as_nanos() as f64 / 1_000_000_000 as f64
    }};
}

fn main() {
    let problem = problem::from_name(&std::env::args().nth(1).expect("no problem given"))
        .expect("failed to load problem");
    let run = std::env::args()
        .nth(2)
        .expect("no run times given")
        .parse::<usize>()
        .expect("run times must be usize");
    let config = config::SolverConfig::default();

    let mut secs: Vec<f64> = Vec::new();
    for _ in (0..run).progress() {
        secs.push(time!({
            problem.compute(&config).expect("failed to compute")
        }));
    }

    let avg = secs.iter().sum::<f64>() / secs.len() as f64;
    let std = (secs
        .iter()
        .map(|t| t - avg)
        .map(|t| t * t)
        .sum::<f64>()
        / secs.len() as f64)
        .sqrt();

    dbg!(avg);
    dbg!(std);
}
