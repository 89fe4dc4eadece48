#[cfg(test)]
mod tests {
    use ark_ff::{One, PrimeField};
    use calcwit::circuits::sudoku;
    use calcwit::error::FieldError;
    use calcwit::logging::init_test_logging;
    use calcwit::{Circuit, ComponentState, Fr, InputAssignment, WitnessCalculator, WitnessError};

    const PUZZLE: [[u64; 9]; 9] = [
        [5, 3, 0, 0, 7, 0, 0, 0, 0],
        [6, 0, 0, 1, 9, 5, 0, 0, 0],
        [0, 9, 8, 0, 0, 0, 0, 6, 0],
        [8, 0, 0, 0, 6, 0, 0, 0, 3],
        [4, 0, 0, 8, 0, 3, 0, 0, 1],
        [7, 0, 0, 0, 2, 0, 0, 0, 6],
        [0, 6, 0, 0, 0, 0, 2, 8, 0],
        [0, 0, 0, 4, 1, 9, 0, 0, 5],
        [0, 0, 0, 0, 8, 0, 0, 7, 9],
    ];

    const SOLUTION: [[u64; 9]; 9] = [
        [5, 3, 4, 6, 7, 8, 9, 1, 2],
        [6, 7, 2, 1, 9, 5, 3, 4, 8],
        [1, 9, 8, 3, 4, 2, 5, 6, 7],
        [8, 5, 9, 7, 6, 1, 4, 2, 3],
        [4, 2, 6, 8, 5, 3, 7, 9, 1],
        [7, 1, 3, 9, 2, 4, 8, 5, 6],
        [9, 6, 1, 5, 3, 7, 2, 8, 4],
        [2, 8, 7, 4, 1, 9, 6, 3, 5],
        [3, 4, 5, 2, 8, 6, 1, 7, 9],
    ];

    // main window starts at 1; distinct[k] follows the 162 own signals
    const DISTINCT_BASE: usize = 1 + 162;
    const DISTINCT_WINDOW: usize = 117;
    const IN_RANGE_BASE: usize = 1 + 162 + 9 * DISTINCT_WINDOW;
    const IN_RANGE_WINDOW: usize = 11;

    fn inputs<F: PrimeField>(unsolved: &[[u64; 9]; 9], solved: &[[u64; 9]; 9]) -> Vec<F> {
        unsolved
            .iter()
            .chain(solved.iter())
            .flat_map(|row| row.iter().map(|&v| F::from(v)))
            .collect()
    }

    #[test]
    fn test_valid_grid() {
        init_test_logging();
        let circuit = sudoku::circuit::<Fr>().unwrap();
        let mut calc = WitnessCalculator::new(&circuit);
        calc.execute(&inputs(&PUZZLE, &SOLUTION)).unwrap();

        let stats = calc.stats();
        assert_eq!(stats.created, 577);
        assert_eq!(stats.run, 577);
        assert_eq!(stats.released, 577);
        // Sudoku -> Distinct -> NonEqual
        assert_eq!(stats.max_depth, 3);
        assert!(calc.components().iter().all(|(_, c)| c.state == ComponentState::Released));
        assert_eq!(calc.components().created(), 577);

        let witness = calc.into_witness();
        assert_eq!(witness.len(), 2107);
        assert_eq!(witness[0], Fr::one());
        assert_eq!(witness[1], Fr::from(5u64));
        assert_eq!(witness[82], Fr::from(5u64));

        // every pairwise inequality witness satisfies inv * (a - b) == 1
        for column in 0..9 {
            let distinct = DISTINCT_BASE + column * DISTINCT_WINDOW;
            let own = witness.window(distinct..distinct + 9).unwrap();
            for (expected, actual) in SOLUTION.iter().map(|row| row[column]).zip(own) {
                assert_eq!(Fr::from(expected), *actual);
            }
            for n in 0..36 {
                let base = distinct + 9 + 3 * n;
                let (a, b, inv) = (witness[base], witness[base + 1], witness[base + 2]);
                assert_eq!(inv * (a - b), Fr::one());
            }
        }

        // each range check decomposes value - 1 and value + 6
        for (m, &value) in SOLUTION.iter().flatten().enumerate() {
            let base = IN_RANGE_BASE + m * IN_RANGE_WINDOW;
            assert_eq!(witness[base], Fr::from(value));
            assert_eq!(witness[base + 1], Fr::from(value - 1));
            assert_eq!(witness[base + 6], Fr::from(value + 6));
            for k in 0..4 {
                let bit = ((value - 1) >> k) & 1;
                assert_eq!(witness[base + 2 + k], Fr::from(bit));
            }
        }
    }

    #[test]
    fn test_column_duplicate_fails_first_pairwise_check() {
        let mut solved = SOLUTION;
        solved[1][0] = solved[0][0];
        let circuit = sudoku::circuit::<Fr>().unwrap();
        let err = calcwit::calculate_witness(&circuit, &inputs(&[[0; 9]; 9], &solved)).unwrap_err();
        assert_eq!(
            err,
            WitnessError::Arithmetic {
                source: FieldError::DivisionByZero,
                template: "NonEqual".to_string(),
                line: 9,
                trace: "main->distinct[0]->nonEqual[1][0]".to_string(),
            }
        );
        assert!(err.is_constraint_failure());
    }

    #[test]
    fn test_later_column_duplicate() {
        let mut solved = SOLUTION;
        // column 4 holds 9 at rows 1 and 7
        solved[7][4] = 9;
        let circuit = sudoku::circuit::<Fr>().unwrap();
        let err = calcwit::calculate_witness(&circuit, &inputs(&[[0; 9]; 9], &solved)).unwrap_err();
        match err {
            WitnessError::Arithmetic { trace, line, .. } => {
                assert_eq!(trace, "main->distinct[4]->nonEqual[7][1]");
                assert_eq!(line, 9);
            }
            other => panic!("expected division by zero, got {other}"),
        }
    }

    #[test]
    fn test_row_duplicate() {
        let mut solved = SOLUTION;
        // row 0 now holds 5 twice; column 1 holds 5 at rows 0 and 3
        solved[0][1] = solved[0][0];
        let circuit = sudoku::circuit::<Fr>().unwrap();
        let err = calcwit::calculate_witness(&circuit, &inputs(&[[0; 9]; 9], &solved)).unwrap_err();
        assert_eq!(
            err,
            WitnessError::Arithmetic {
                source: FieldError::DivisionByZero,
                template: "NonEqual".to_string(),
                line: 9,
                trace: "main->distinct[1]->nonEqual[3][0]".to_string(),
            }
        );
    }

    #[test]
    fn test_puzzle_must_match_solution() {
        let mut unsolved = PUZZLE;
        unsolved[0][2] = 1;
        let circuit = sudoku::circuit::<Fr>().unwrap();
        let err = calcwit::calculate_witness(&circuit, &inputs(&unsolved, &SOLUTION)).unwrap_err();
        assert_eq!(
            err,
            WitnessError::AssertionFailed {
                template: "Sudoku".to_string(),
                line: 59,
                trace: "main".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Failed assert in template Sudoku line 59. Followed trace of components: main"
        );
    }

    #[test]
    fn test_out_of_range_cell() {
        let mut solved = SOLUTION;
        solved[0][0] = 0;
        let circuit = sudoku::circuit::<Fr>().unwrap();
        let err = calcwit::calculate_witness(&circuit, &inputs(&[[0; 9]; 9], &solved)).unwrap_err();
        assert_eq!(
            err,
            WitnessError::AssertionFailed {
                template: "Bits4".to_string(),
                line: 35,
                trace: "main->inRange[0][0]->lowerBound".to_string(),
            }
        );

        solved[0][0] = 10;
        let err = calcwit::calculate_witness(&circuit, &inputs(&[[0; 9]; 9], &solved)).unwrap_err();
        assert!(matches!(
            err,
            WitnessError::AssertionFailed { line: 35, ref trace, .. }
                if trace == "main->inRange[0][0]->upperBound"
        ));
    }

    #[test]
    fn test_other_field() {
        let circuit = sudoku::circuit::<ark_bls12_381::Fr>().unwrap();
        let witness =
            calcwit::calculate_witness(&circuit, &inputs(&PUZZLE, &SOLUTION)).unwrap();
        assert_eq!(witness.len(), 2107);
        assert_eq!(witness[IN_RANGE_BASE + 1], ark_bls12_381::Fr::from(4u64));
    }

    #[test]
    fn test_named_json_inputs() {
        let to_json = |grid: &[[u64; 9]; 9]| {
            let rows: Vec<String> = grid
                .iter()
                .map(|row| {
                    let cells: Vec<String> = row.iter().map(u64::to_string).collect();
                    format!("[{}]", cells.join(","))
                })
                .collect();
            format!("[{}]", rows.join(","))
        };
        let json = format!(
            r#"{{ "solved": {}, "unsolved": {} }}"#,
            to_json(&SOLUTION),
            to_json(&PUZZLE)
        );
        let assignment = InputAssignment::<Fr>::from_json(&json).unwrap();
        let circuit = sudoku::circuit::<Fr>().unwrap();

        let from_json = WitnessCalculator::new(&circuit)
            .evaluate_assignment(&assignment)
            .unwrap();
        let direct = calcwit::calculate_witness(&circuit, &inputs(&PUZZLE, &SOLUTION)).unwrap();
        assert_eq!(from_json.digest(), direct.digest());
    }

    #[test]
    fn test_description_round_trip() {
        let circuit = sudoku::circuit::<Fr>().unwrap();
        let json = circuit.to_json().unwrap();
        let reloaded = Circuit::<Fr>::from_json(&json).unwrap();
        assert_eq!(reloaded.total_signals(), 2107);
        assert_eq!(reloaded.total_components(), 577);

        let a = calcwit::calculate_witness(&circuit, &inputs(&PUZZLE, &SOLUTION)).unwrap();
        let b = calcwit::calculate_witness(&reloaded, &inputs(&PUZZLE, &SOLUTION)).unwrap();
        assert_eq!(a, b);
    }
}
