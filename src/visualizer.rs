use super::decision::{DecisionReport, ScenarioStatus, SolutionRecord, VerificationRecord};

pub fn print_model(report: &DecisionReport) {
    println!("E[u({})] = {}", report.decision, report.expected_utility);
    print!("L({}", report.decision);
    for multiplier in report.multipliers.iter() {
        print!(", {}", multiplier);
    }
    println!(") = {}", report.lagrangian);
    println!("∂L/∂{} = {} = 0", report.decision, report.stationarity_equation);
}

pub fn print_solution(report: &DecisionReport, solution: &SolutionRecord) {
    print!("  {} = {}", report.decision, solution.decision_value);
    for multiplier in solution.multiplier_values.iter() {
        print!(", {} = {}", multiplier.symbol, multiplier.value);
    }
    for symbol in solution.undetermined.iter() {
        print!(", {} free", symbol);
    }
    println!();
}

pub fn print_verification(verification: &VerificationRecord) {
    match verification {
        VerificationRecord::Checked {
            constraint_index,
            residual,
            satisfied,
            ..
        } => println!(
            "    constraint {}: residual {} ({})",
            constraint_index + 1,
            residual,
            if *satisfied { "satisfied" } else { "not satisfied" }
        ),
        VerificationRecord::Unverifiable {
            constraint_index,
            error,
            ..
        } => println!("    constraint {}: unverifiable, {}", constraint_index + 1, error),
    }
}

pub fn print_report(report: &DecisionReport) {
    print_model(report);
    for (scenario_index, scenario) in report.scenarios.iter().enumerate() {
        println!(
            "{} = {} (p = {}):",
            report.rival, scenario.rival_value, scenario.probability
        );
        match &scenario.status {
            ScenarioStatus::Solved { .. } => {}
            ScenarioStatus::NoSolution => println!("  no solution"),
            ScenarioStatus::Failed { error } => println!("  failed: {}", error),
        }
        for (solution_index, solution) in report
            .solutions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.scenario_index == scenario_index)
        {
            print_solution(report, solution);
            for verification in report
                .verifications
                .iter()
                .filter(|v| v.solution_index() == solution_index)
            {
                print_verification(verification);
            }
        }
    }
}
