extern crate lagrange_decision;

#[cfg(test)]
mod tests {
    use approx_eq::assert_approx_eq;
    use lagrange_decision::*;
    use lagrange_decision::{
        config::SolverConfig,
        error::SolveError,
        scenario::ScenarioDistribution,
        solver::{Outcome, ScenarioSolutions},
        symbol::Symbol,
    };

    fn solve(
        objective: &str,
        constraints: &[&str],
        values: Vec<f64>,
        probabilities: Vec<f64>,
        config: &SolverConfig,
    ) -> (Vec<ScenarioSolutions>, lagrangian::LagrangianModel) {
        let (x, y) = (Symbol::new("xA"), Symbol::new("xB"));
        let scenario = ScenarioDistribution::new(values, probabilities).unwrap();
        let expected_utility = expectation::build_expected_utility(
            objective,
            &x,
            &y,
            scenario.values(),
            scenario.probabilities(),
        )
        .unwrap();
        let constraints: Vec<String> = constraints.iter().map(|c| c.to_string()).collect();
        let model = lagrangian::compose(expected_utility, &constraints, &x, &y).unwrap();
        let multipliers = model.multiplier_symbols();
        let solved =
            solver::solve_per_scenario(&model, &x, &multipliers, &y, &scenario, config);
        (solved, model)
    }

    #[test]
    fn shared_resource() {
        let (solved, model) = solve(
            "-10*xA",
            &["20 - xA - xB"],
            vec![0.0, 10.0],
            vec![0.5, 0.5],
            &SolverConfig::default(),
        );
        let (x, y, l1) = (Symbol::new("xA"), Symbol::new("xB"), Symbol::new("λ1"));

        assert_eq!(solved.len(), 2);
        for (scenario, expected) in solved.iter().zip(&[20.0, 10.0]) {
            let solutions = scenario.solutions();
            assert_eq!(solutions.len(), 1);
            assert_approx_eq!(solutions[0].value(&x).unwrap(), *expected);
            assert_approx_eq!(solutions[0].value(&l1).unwrap(), -10.0);
            assert_eq!(solutions[0].rival_value(), scenario.rival_value);

            for check in verifier::verify(&solutions[0], &model.constraints(), &x, &y) {
                let check = check.unwrap();
                assert!(check.residual.abs() < 1e-12);
                assert!(check.satisfied);
            }
        }
    }

    #[test]
    fn sequential_matches_parallel() {
        let sequential = SolverConfig {
            parallel: false,
            ..Default::default()
        };
        let values = vec![0.0, 2.5, 5.0, 7.5, 10.0];
        let probabilities = vec![0.2; 5];
        let (a, _) = solve(
            "-10*xA",
            &["20 - xA - xB"],
            values.clone(),
            probabilities.clone(),
            &sequential,
        );
        let (b, _) = solve(
            "-10*xA",
            &["20 - xA - xB"],
            values,
            probabilities,
            &SolverConfig::default(),
        );
        assert_eq!(a, b);
        let rivals: Vec<f64> = b.iter().map(|s| s.rival_value).collect();
        assert_eq!(rivals, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn every_root_is_reported() {
        let (solved, model) = solve(
            "-xA",
            &["xA^2 - xB"],
            vec![4.0, 9.0],
            vec![0.5, 0.5],
            &SolverConfig::default(),
        );
        let (x, y, l1) = (Symbol::new("xA"), Symbol::new("xB"), Symbol::new("λ1"));

        for (scenario, root) in solved.iter().zip(&[2.0, 3.0]) {
            let solutions = scenario.solutions();
            assert_eq!(solutions.len(), 2);
            assert_approx_eq!(solutions[0].value(&x).unwrap(), -root);
            assert_approx_eq!(solutions[1].value(&x).unwrap(), *root);
            assert_approx_eq!(solutions[0].value(&l1).unwrap(), -0.5 / root);
            assert_approx_eq!(solutions[1].value(&l1).unwrap(), 0.5 / root);
            for solution in solutions {
                assert!(verifier::verify(solution, &model.constraints(), &x, &y)
                    .into_iter()
                    .all(|check| check.unwrap().satisfied));
            }
        }
    }

    #[test]
    fn no_real_root() {
        let (solved, _) = solve(
            "-xA",
            &["xA^2 - xB"],
            vec![-1.0, 1.0],
            vec![0.5, 0.5],
            &SolverConfig::default(),
        );
        assert_eq!(solved[0].outcome, Outcome::NoSolution);
        assert_eq!(solved[1].solutions().len(), 2);
    }

    #[test]
    fn unsolvable_scenario_does_not_affect_others() {
        let (solved, _) = solve(
            "-10*xA",
            &["xA*xB - 1"],
            vec![0.0, 10.0],
            vec![0.5, 0.5],
            &SolverConfig::default(),
        );
        let (x, l1) = (Symbol::new("xA"), Symbol::new("λ1"));

        assert_eq!(solved[0].outcome, Outcome::NoSolution);
        assert!(solved[0].solutions().is_empty());
        let solutions = solved[1].solutions();
        assert_eq!(solutions.len(), 1);
        assert_approx_eq!(solutions[0].value(&x).unwrap(), 0.1);
        assert_approx_eq!(solutions[0].value(&l1).unwrap(), 1.0);
    }

    #[test]
    fn contradictory_constraints() {
        let (solved, _) = solve(
            "-10*xA",
            &["xA - xB", "xA - 5"],
            vec![5.0, 10.0],
            vec![0.5, 0.5],
            &SolverConfig::default(),
        );
        let x = Symbol::new("xA");

        let solutions = solved[0].solutions();
        assert_eq!(solutions.len(), 1);
        assert_approx_eq!(solutions[0].value(&x).unwrap(), 5.0);
        // only λ1 + λ2 = 10 is known
        assert_eq!(
            solutions[0].undetermined(),
            &[Symbol::new("λ1"), Symbol::new("λ2")]
        );
        assert_eq!(solved[1].outcome, Outcome::NoSolution);
    }

    #[test]
    fn undetermined_decision() {
        let (solved, _) = solve("xB", &[], vec![1.0], vec![1.0], &SolverConfig::default());
        assert_eq!(
            solved[0].outcome,
            Outcome::Failed(SolveError::Underdetermined(Symbol::new("xA")))
        );
    }

    #[test]
    fn unconstrained_quadratic() {
        let (solved, model) = solve(
            "xA*(100 - xA - xB) - 10*xA",
            &[],
            vec![20.0, 30.0, 40.0],
            vec![0.2, 0.5, 0.3],
            &SolverConfig::default(),
        );
        assert!(model.multipliers.is_empty());
        for scenario in solved.iter() {
            let solutions = scenario.solutions();
            assert_eq!(solutions.len(), 1);
            assert_approx_eq!(solutions[0].value(&Symbol::new("xA")).unwrap(), 29.5);
        }
    }

    #[test]
    fn timeout() {
        let config = SolverConfig {
            timeout_ms: Some(0),
            ..Default::default()
        };
        let (solved, _) = solve("-xA", &["xA^2 - xB"], vec![4.0], vec![1.0], &config);
        assert_eq!(
            solved[0].outcome,
            Outcome::Failed(SolveError::Timeout { millis: 0 })
        );
    }

    #[test]
    fn scenario_independence() {
        let (all, _) = solve(
            "-10*xA + xA*xB",
            &["20 - xA - xB"],
            vec![0.0, 5.0, 10.0],
            vec![0.2, 0.3, 0.5],
            &SolverConfig::default(),
        );
        let (kept, _) = solve(
            "-10*xA + xA*xB",
            &["20 - xA - xB"],
            vec![0.0, 10.0],
            vec![0.2 / 0.7, 0.5 / 0.7],
            &SolverConfig::default(),
        );
        let x = Symbol::new("xA");
        for (a, b) in [&all[0], &all[2]].iter().zip(kept.iter()) {
            assert_eq!(a.rival_value, b.rival_value);
            assert_approx_eq!(
                a.solutions()[0].value(&x).unwrap(),
                b.solutions()[0].value(&x).unwrap()
            );
        }
    }

    #[test]
    fn linear_with_large_rival_values() {
        let (solved, _) = solve(
            "-xA",
            &["0.0001*xA - xB"],
            vec![100.0, 1e6],
            vec![0.5, 0.5],
            &SolverConfig::default(),
        );
        let (x, l1) = (Symbol::new("xA"), Symbol::new("λ1"));
        for (scenario, expected) in solved.iter().zip(&[1e6, 1e10]) {
            let solutions = scenario.solutions();
            assert_eq!(solutions.len(), 1);
            assert_approx_eq!(solutions[0].value(&x).unwrap(), *expected);
            assert_approx_eq!(solutions[0].value(&l1).unwrap(), 1e4);
        }

        let (solved, _) = solve(
            "-xA",
            &["3*xA - xB"],
            vec![1e12],
            vec![1.0],
            &SolverConfig::default(),
        );
        assert_approx_eq!(solved[0].solutions()[0].value(&x).unwrap(), 1e12 / 3.0);
    }

    #[test]
    fn nonlinear_with_large_roots() {
        let (solved, _) = solve(
            "-xA",
            &["xA^3 - xB"],
            vec![8.0, 3e9, 7e7],
            vec![0.2, 0.4, 0.4],
            &SolverConfig::default(),
        );
        let x = Symbol::new("xA");
        for (scenario, rival) in solved.iter().zip(&[8.0f64, 3e9, 7e7]) {
            let solutions = scenario.solutions();
            assert_eq!(solutions.len(), 1);
            assert_approx_eq!(solutions[0].value(&x).unwrap(), rival.cbrt());
        }
    }
}
