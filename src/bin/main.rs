use argh::FromArgs;
use lagrange_decision::*;
use std::time::Instant;

#[macro_use]
extern crate log;

#[derive(FromArgs)]
/// Optimal decision against a rival known through a discrete distribution.
struct Args {
    /// bundled problem name or path to a problem JSON file
    #[argh(option, short = 'p')]
    problem: Option<String>,

    /// decision variable
    #[argh(option, default = "String::from(\"xA\")")]
    decision: String,

    /// objective u(decision, rival)
    #[argh(option, default = "String::from(\"-10*xA\")")]
    objective: String,

    /// rival's decision variable
    #[argh(option, default = "String::from(\"xB\")")]
    rival: String,

    /// comma-separated rival values
    #[argh(option, default = "String::from(\"0,10\")")]
    values: String,

    /// comma-separated probabilities of the rival values
    #[argh(option, default = "String::from(\"0.5,0.5\")")]
    probabilities: String,

    /// equality constraint `expr = 0`, may be repeated
    #[argh(option, short = 'c')]
    constraint: Vec<String>,

    /// path to a solver config JSON file
    #[argh(option)]
    config: Option<String>,

    /// output format, `text` or `json`
    #[argh(option, default = "String::from(\"text\")")]
    format: String,
}

fn main() {
    env_logger::init();

    trace!("start: main");
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => config::from_file(path).expect("failed to load config"),
        None => Default::default(),
    };
    let problem = match &args.problem {
        Some(name) => problem::from_name(name).expect("failed to load problem"),
        None => problem::Problem {
            decision: args.decision.clone(),
            objective: args.objective.clone(),
            rival: args.rival.clone(),
            values: problem::parse_list(&args.values).expect("values must be numbers"),
            probabilities: problem::parse_list(&args.probabilities)
                .expect("probabilities must be numbers"),
            constraints: args.constraint.clone(),
        },
    };

    let start = Instant::now();
    let report = match problem.compute(&config) {
        Ok(report) => report,
        Err(error) => {
            error!("{}", error);
            eprintln!("error: {}", error);
            std::process::exit(1);
        }
    };
    info!("elapsed time: {} [sec]", start.elapsed().as_secs_f64());

    match args.format.as_str() {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("failed to serialize report")
        ),
        _ => visualizer::print_report(&report),
    }

    trace!("finish: main");
}
