extern crate lagrange_decision;

#[cfg(test)]
mod tests {
    use approx_eq::assert_approx_eq;
    use lagrange_decision::*;
    use lagrange_decision::{
        config::SolverConfig,
        decision::{ScenarioStatus, VerificationRecord},
        error::{DecisionError, EvaluationError, ParseError, ProbabilityError},
        lagrangian::Constraint,
        symbol::Symbol,
    };

    fn shared_resource(
        values: &[f64],
        probabilities: &[f64],
        constraints: &[&str],
    ) -> Result<decision::DecisionReport, DecisionError> {
        let constraints: Vec<String> = constraints.iter().map(|c| c.to_string()).collect();
        decision::compute_decision(
            "xA",
            "-10*xA",
            "xB",
            values,
            probabilities,
            &constraints,
            &SolverConfig::default(),
        )
    }

    #[test]
    fn worked_example() {
        let report = shared_resource(&[0.0, 10.0], &[0.5, 0.5], &["20 - xA - xB"]).unwrap();
        let (x, l1) = (Symbol::new("xA"), Symbol::new("λ1"));

        assert_eq!(report.multipliers, vec![l1.clone()]);
        assert_approx_eq!(
            report
                .expected_utility
                .substitute_value(&x, 3.0)
                .evaluate()
                .unwrap(),
            -30.0
        );
        assert_eq!(
            report.lagrangian.to_string(),
            "-5 * xA + -5 * xA + λ1 * (20 - xA - xB)"
        );
        assert_eq!(report.stationarity_equation.to_string(), "-10 - λ1");

        assert_eq!(report.solutions.len(), 2);
        for (solution, expected) in report.solutions.iter().zip(&[20.0, 10.0]) {
            assert_approx_eq!(solution.decision_value, *expected);
            assert_eq!(solution.multiplier_values.len(), 1);
            assert_eq!(solution.multiplier_values[0].symbol, l1);
            assert_approx_eq!(solution.multiplier_values[0].value, -10.0);
            assert!(solution.undetermined.is_empty());
            assert!(solution.verified);

            let stationarity = report
                .stationarity_equation
                .substitute_value(&l1, solution.multiplier_values[0].value)
                .evaluate()
                .unwrap();
            assert!(stationarity.abs() < 1e-12);
        }

        assert_eq!(report.verifications.len(), 2);
        for (i, verification) in report.verifications.iter().enumerate() {
            match verification {
                VerificationRecord::Checked {
                    solution_index,
                    constraint_index,
                    residual,
                    satisfied,
                    ..
                } => {
                    assert_eq!(*solution_index, i);
                    assert_eq!(*constraint_index, 0);
                    assert!(residual.abs() < 1e-12);
                    assert!(satisfied);
                }
                VerificationRecord::Unverifiable { error, .. } => panic!("{}", error),
            }
        }
    }

    #[test]
    fn probabilities_must_sum_to_one() {
        assert!(shared_resource(&[0.0, 10.0], &[0.5, 0.5], &[]).is_ok());
        assert!(shared_resource(&[0.0, 10.0], &[0.3, 0.7 + 1e-12], &[]).is_ok());
        assert!(matches!(
            shared_resource(&[0.0, 10.0], &[0.5, 0.4], &[]),
            Err(DecisionError::Probability(ProbabilityError::Sum { .. }))
        ));
        assert!(matches!(
            shared_resource(&[0.0, 10.0], &[1.5, -0.5], &[]),
            Err(DecisionError::Probability(ProbabilityError::Invalid { index: 1, .. }))
        ));
    }

    #[test]
    fn scenario_mismatch() {
        match shared_resource(&[0.0, 10.0], &[1.0], &[]) {
            Err(DecisionError::ScenarioMismatch(error)) => {
                assert_eq!(error.values, 2);
                assert_eq!(error.probabilities, 1);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parse_errors() {
        let config = SolverConfig::default();
        assert!(matches!(
            decision::compute_decision("xA", "xA +", "xB", &[0.0], &[1.0], &[], &config),
            Err(DecisionError::Objective(ParseError::UnexpectedEnd { .. }))
        ));
        match shared_resource(&[0.0], &[1.0], &["20 - xA - xB", "xA * zz"]) {
            Err(DecisionError::Constraint { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(
                    source,
                    ParseError::UnknownSymbol {
                        name: String::from("zz"),
                        offset: 5
                    }
                );
            }
            other => panic!("{:?}", other),
        }
        assert!(matches!(
            decision::compute_decision("xA", "xA", "xA", &[0.0], &[1.0], &[], &config),
            Err(DecisionError::InvalidInput(_))
        ));
        assert!(matches!(
            decision::compute_decision("1x", "xB", "xB", &[0.0], &[1.0], &[], &config),
            Err(DecisionError::InvalidInput(_))
        ));
        assert!(matches!(
            decision::compute_decision("xA", "xB", "yB", &[0.0], &[1.0], &[], &config),
            Err(DecisionError::Objective(ParseError::UnknownSymbol { .. }))
        ));
    }

    #[test]
    fn deterministic() {
        let problem = problem::from_name("square_root").unwrap();
        let config = SolverConfig::default();
        assert_eq!(
            problem.compute(&config).unwrap(),
            problem.compute(&config).unwrap()
        );
    }

    #[test]
    fn one_scenario_without_solution() {
        let report = shared_resource(&[0.0, 10.0], &[0.5, 0.5], &["xA*xB - 1"]).unwrap();

        assert_eq!(report.scenarios[0].status, ScenarioStatus::NoSolution);
        assert_eq!(report.scenarios[1].status, ScenarioStatus::Solved { count: 1 });
        assert_eq!(report.solutions.len(), 1);
        assert_eq!(report.solutions[0].scenario_index, 1);
        assert_approx_eq!(report.solutions[0].decision_value, 0.1);
        assert!(report.solutions[0].verified);
    }

    #[test]
    fn undetermined_multipliers() {
        let report =
            shared_resource(&[5.0, 10.0], &[0.5, 0.5], &["xA - xB", "xA - 5"]).unwrap();

        assert_eq!(report.scenarios[1].status, ScenarioStatus::NoSolution);
        let solution = &report.solutions[0];
        assert_approx_eq!(solution.decision_value, 5.0);
        assert!(solution.multiplier_values.is_empty());
        assert_eq!(
            solution.undetermined,
            vec![Symbol::new("λ1"), Symbol::new("λ2")]
        );
        assert!(solution.verified);
    }

    #[test]
    fn underdetermined_decision() {
        let report = decision::compute_decision(
            "xA",
            "7 * xB",
            "xB",
            &[1.0, 2.0],
            &[0.5, 0.5],
            &[],
            &SolverConfig::default(),
        )
        .unwrap();

        assert!(report.solutions.is_empty());
        for scenario in report.scenarios.iter() {
            match &scenario.status {
                ScenarioStatus::Failed { error } => assert!(error.contains("xA")),
                other => panic!("{:?}", other),
            }
        }
    }

    #[test]
    fn timeout_is_scoped_to_the_scenario() {
        let problem = problem::from_name("square_root").unwrap();
        let config = SolverConfig {
            timeout_ms: Some(0),
            ..Default::default()
        };
        let report = problem.compute(&config).unwrap();

        assert!(report.solutions.is_empty());
        for scenario in report.scenarios.iter() {
            assert!(matches!(scenario.status, ScenarioStatus::Failed { .. }));
        }
    }

    #[test]
    fn bundled_problems() {
        let config = SolverConfig::default();

        let report = problem::from_name("quadratic_cost")
            .unwrap()
            .compute(&config)
            .unwrap();
        assert!(report.multipliers.is_empty());
        assert_eq!(report.solutions.len(), 3);
        for solution in report.solutions.iter() {
            assert_approx_eq!(solution.decision_value, 29.5);
        }
        assert!(report.verifications.is_empty());

        let report = problem::from_name("square_root")
            .unwrap()
            .compute(&config)
            .unwrap();
        let decisions: Vec<f64> = report.solutions.iter().map(|s| s.decision_value).collect();
        assert_eq!(decisions.len(), 4);
        for (decision, expected) in decisions.iter().zip(&[-2.0, 2.0, -3.0, 3.0]) {
            assert_approx_eq!(*decision, *expected);
        }
        assert!(report.solutions.iter().all(|s| s.verified));
    }

    fn shared_resource_solution() -> solver::Solution {
        let (x, y) = (Symbol::new("xA"), Symbol::new("xB"));
        let expected_utility =
            expectation::build_expected_utility("-10*xA", &x, &y, &[0.0], &[1.0]).unwrap();
        let model =
            lagrangian::compose(expected_utility, &[String::from("20 - xA - xB")], &x, &y)
                .unwrap();
        let solved = solver::solve_per_scenario(
            &model,
            &x,
            &model.multiplier_symbols(),
            &y,
            &scenario::ScenarioDistribution::new(vec![0.0], vec![1.0]).unwrap(),
            &SolverConfig::default(),
        );
        solved[0].solutions()[0].clone()
    }

    fn constraint(text: &str) -> Constraint {
        Constraint {
            source: String::from(text),
            expression: parser::parse(text, &[Symbol::new("xA"), Symbol::new("xB")]).unwrap(),
        }
    }

    #[test]
    fn unverifiable_constraint() {
        let solution = shared_resource_solution();
        let (x, y) = (Symbol::new("xA"), Symbol::new("xB"));
        assert_eq!(solution.value(&x), Some(20.0));

        let constraints = vec![constraint("1/(xA - 20)"), constraint("20 - xA - xB")];
        let checks = verifier::verify(&solution, &constraints, &x, &y);

        let failure = checks[0].clone().unwrap_err();
        assert_eq!(failure.constraint_index, 0);
        assert_eq!(failure.error, EvaluationError::DivisionByZero);
        assert!(checks[1].clone().unwrap().satisfied);
    }

    #[test]
    fn residual_classification() {
        let solution = shared_resource_solution();
        let (x, y) = (Symbol::new("xA"), Symbol::new("xB"));

        let checks = verifier::verify(&solution, &[constraint("20.001 - xA - xB")], &x, &y);
        let check = checks[0].clone().unwrap();
        assert_approx_eq!(check.residual, 1e-3);
        assert!(!check.satisfied);

        // a residual equal to the tolerance is not satisfied
        let half = [constraint("20.5 - xA - xB")];
        let check = verifier::verify_within(&solution, &half, &x, &y, 0.5)[0]
            .clone()
            .unwrap();
        assert_eq!(check.residual, 0.5);
        assert!(!check.satisfied);
        let check = verifier::verify_within(&solution, &half, &x, &y, 0.5000001)[0]
            .clone()
            .unwrap();
        assert!(check.satisfied);

        let strict = SolverConfig {
            verification_tolerance: 0.0,
            ..Default::default()
        };
        let report = decision::compute_decision(
            "xA",
            "-10*xA",
            "xB",
            &[0.0, 10.0],
            &[0.5, 0.5],
            &[String::from("20 - xA - xB")],
            &strict,
        )
        .unwrap();
        assert_eq!(report.solutions.len(), 2);
        assert!(report.solutions.iter().all(|s| !s.verified));
        assert!(report.verifications.iter().all(|v| !v.satisfied()));
    }

    #[test]
    fn expected_utility_checks_counts() {
        let (x, y) = (Symbol::new("xA"), Symbol::new("xB"));
        match expectation::build_expected_utility("-10*xA", &x, &y, &[0.0, 10.0], &[1.0]) {
            Err(DecisionError::ScenarioMismatch(error)) => {
                assert_eq!(error.values, 2);
                assert_eq!(error.probabilities, 1);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn report_json() {
        let report = shared_resource(&[0.0, 10.0], &[0.5, 0.5], &["xA*xB - 1"]).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["decision"], "xA");
        assert_eq!(json["multipliers"][0], "λ1");
        assert_eq!(json["stationarity_equation"], "-10 + λ1 * xB");
        assert_eq!(json["scenarios"][0]["status"], "no_solution");
        assert_eq!(json["scenarios"][1]["status"], "solved");
        assert_eq!(json["scenarios"][1]["count"], 1);
        assert_eq!(json["solutions"][0]["multiplier_values"][0]["symbol"], "λ1");
        assert_eq!(json["verifications"][0]["status"], "checked");
        assert_eq!(json["verifications"][0]["satisfied"], true);
    }

    #[test]
    fn problem_from_json() {
        let problem = problem::from_json(
            r#"{
                "decision": "xA",
                "objective": "-10*xA",
                "rival": "xB",
                "values": [0, 10],
                "probabilities": [0.5, 0.5]
            }"#,
        )
        .unwrap();
        assert!(problem.constraints.is_empty());
        assert_eq!(
            problem,
            problem::Problem {
                constraints: vec![],
                ..problem::from_name("shared_resource").unwrap()
            }
        );

        assert_eq!(problem::parse_list("0, 10").unwrap(), vec![0.0, 10.0]);
        assert_eq!(problem::parse_list("0.5,0.5").unwrap(), vec![0.5, 0.5]);
        assert!(matches!(
            problem::parse_list("0, ten"),
            Err(DecisionError::InvalidInput(_))
        ));
    }

    #[test]
    fn config_from_json() {
        let config = config::from_json(r#"{ "timeout_ms": 50, "parallel": false }"#).unwrap();
        assert_eq!(config.timeout_ms, Some(50));
        assert!(!config.parallel);
        assert_eq!(config.seeds, SolverConfig::default().seeds);
    }
}
