#[cfg(test)]
mod tests {
    use ark_ff::One;
    use calcwit::circuits::sudoku::{self, NON_EQUAL};
    use calcwit::template::{Expr, Stmt, TemplateDef, TemplateId};
    use calcwit::{Circuit, ComponentId, ComponentState, Fr, WitnessCalculator, WitnessError};

    const MAIN: ComponentId = ComponentId::MAIN;

    fn non_equal() -> Circuit<Fr> {
        sudoku::circuit_for(NON_EQUAL).unwrap()
    }

    #[test]
    fn test_run_only_after_every_input() {
        let circuit = non_equal();
        let mut calc = WitnessCalculator::new(&circuit);
        calc.create_component(NON_EQUAL, 1, MAIN, "main".to_string(), None)
            .unwrap();
        calc.write_input(MAIN, 0, Fr::from(3u64)).unwrap();
        assert_eq!(calc.component(MAIN).unwrap().remaining_inputs, 1);

        assert_eq!(
            calc.run(MAIN),
            Err(WitnessError::NotReady {
                trace: "main".to_string(),
                remaining: 1,
            })
        );
        assert_eq!(
            calc.release(MAIN),
            Err(WitnessError::PrematureRelease {
                trace: "main".to_string(),
                state: ComponentState::Created,
            })
        );

        // the last input runs the body
        calc.write_input(MAIN, 1, Fr::from(5u64)).unwrap();
        assert_eq!(calc.component(MAIN).unwrap().state, ComponentState::Completed);
        assert_eq!(calc.stats().run, 1);
        let inv = calc.signal(3).unwrap();
        assert_eq!(inv * (Fr::from(3u64) - Fr::from(5u64)), Fr::one());

        assert_eq!(
            calc.run(MAIN),
            Err(WitnessError::AlreadyStarted {
                trace: "main".to_string(),
                state: ComponentState::Completed,
            })
        );
        assert!(matches!(
            calc.write_input(MAIN, 0, Fr::one()),
            Err(WitnessError::NotAccepting {
                state: ComponentState::Completed,
                ..
            })
        ));
        assert_eq!(calc.stats().run, 1);

        calc.release(MAIN).unwrap();
        assert_eq!(calc.component(MAIN).unwrap().state, ComponentState::Released);
        assert!(matches!(
            calc.release(MAIN),
            Err(WitnessError::PrematureRelease {
                state: ComponentState::Released,
                ..
            })
        ));
    }

    #[test]
    fn test_inputs_beyond_arity() {
        let source = TemplateDef::new("Source", 0, 1);
        let circuit = Circuit::<Fr>::new(vec![source], vec![], TemplateId(0)).unwrap();
        let mut calc = WitnessCalculator::new(&circuit);
        calc.create_component(TemplateId(0), 1, MAIN, "main".to_string(), None)
            .unwrap();
        assert_eq!(
            calc.write_input(MAIN, 0, Fr::one()),
            Err(WitnessError::InputOverflow {
                trace: "main".to_string(),
                arity: 0,
            })
        );
        calc.run(MAIN).unwrap();
        calc.release(MAIN).unwrap();
    }

    #[test]
    fn test_inputs_only_address_own_signals() {
        let circuit = non_equal();
        let mut calc = WitnessCalculator::new(&circuit);
        calc.create_component(NON_EQUAL, 1, MAIN, "main".to_string(), None)
            .unwrap();
        assert!(matches!(
            calc.write_input(MAIN, 3, Fr::one()),
            Err(WitnessError::WindowOutOfRange { index: 3, len: 3, .. })
        ));
        // nothing was consumed
        assert_eq!(calc.component(MAIN).unwrap().remaining_inputs, 2);
    }

    #[test]
    fn test_descriptor_allocation() {
        let circuit = non_equal();
        let mut calc = WitnessCalculator::new(&circuit);
        assert_eq!(
            calc.create_component(NON_EQUAL, 2, MAIN, "main".to_string(), None),
            Err(WitnessError::SignalOutOfRange { index: 4, len: 4 })
        );
        calc.create_component(NON_EQUAL, 1, MAIN, "main".to_string(), None)
            .unwrap();
        assert_eq!(
            calc.create_component(NON_EQUAL, 1, MAIN, "again".to_string(), None),
            Err(WitnessError::DuplicateComponent(0))
        );
        assert_eq!(
            calc.create_component(NON_EQUAL, 1, ComponentId(1), "extra".to_string(), Some(MAIN)),
            Err(WitnessError::ComponentCapacity { id: 1, capacity: 1 })
        );
        assert_eq!(
            calc.run(ComponentId(5)),
            Err(WitnessError::UnknownComponent(5))
        );
    }

    #[test]
    fn test_failed_pass_leaves_state_for_inspection() {
        let mut def = TemplateDef::new("Check", 1, 1);
        def.push(Stmt::assert(Expr::signal(0).equals(Expr::constant(0)), 4));
        let circuit = Circuit::new(vec![def], vec![Fr::from(7u64)], TemplateId(0)).unwrap();

        let mut calc = WitnessCalculator::new(&circuit);
        let err = calc.execute(&[Fr::from(6u64)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed assert in template Check line 4. Followed trace of components: main"
        );
        assert_eq!(calc.component(MAIN).unwrap().state, ComponentState::Running);
        assert_eq!(calc.signal(1).unwrap(), Fr::from(6u64));

        let mut calc = WitnessCalculator::new(&circuit);
        calc.execute(&[Fr::from(7u64)]).unwrap();
        assert_eq!(calc.component(MAIN).unwrap().state, ComponentState::Released);
    }
}
