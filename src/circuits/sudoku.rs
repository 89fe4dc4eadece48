//! Sudoku solution checker.
//!
//! `Sudoku` takes a puzzle (`unsolved`, zero for blank cells) and a candidate
//! solution (`solved`). It checks that the solution agrees with every given
//! cell, that each solution cell lies in `1..=9` (`OneToNine`, built from two
//! 4-bit decompositions) and that each column holds nine distinct values
//! (`Distinct`, built from 36 pairwise `NonEqual` gadgets).

use ark_ff::PrimeField;

use crate::circuit::Circuit;
use crate::error::CircuitError;
use crate::template::{Address, ChildBlock, Expr, InputSignal, Stmt, TemplateDef, TemplateId};

pub const NON_EQUAL: TemplateId = TemplateId(0);
pub const DISTINCT: TemplateId = TemplateId(1);
pub const BITS4: TemplateId = TemplateId(2);
pub const ONE_TO_NINE: TemplateId = TemplateId(3);
pub const SUDOKU: TemplateId = TemplateId(4);

const ONE: usize = 0;
const NINE: usize = 1;
const ZERO: usize = 2;
const FOUR: usize = 3;
const TWO: usize = 4;
const SIX: usize = 5;

/// Grid side length.
pub const SIZE: usize = 9;

pub fn constants<F: PrimeField>() -> Vec<F> {
    [1u64, 9, 0, 4, 2, 6].into_iter().map(F::from).collect()
}

/// `in[0] != in[1]`, witnessed by `inv = 1 / (in[0] - in[1])`.
///
/// Signals: `in[0]`, `in[1]`, `inv`.
pub fn non_equal_template() -> TemplateDef {
    let mut def = TemplateDef::new("NonEqual", 2, 3)
        .with_input_signals(vec![InputSignal::new("in", vec![2])]);
    let diff = || Expr::signal(0) - Expr::signal(1);
    def.push(Stmt::set_signal(2, Expr::constant(ONE) / diff(), 9));
    def.push(Stmt::assert((Expr::signal(2) * diff()).equals(Expr::constant(ONE)), 10));
    def
}

/// Nine pairwise-distinct inputs. One `NonEqual` per pair `j < i`, stored at `nonEqual[i][j]`.
pub fn distinct_template() -> TemplateDef {
    let (n, i, j) = (0, 1, 2);
    let mut def = TemplateDef::new("Distinct", SIZE, SIZE)
        .with_locals(3)
        .with_input_signals(vec![InputSignal::new("in", vec![SIZE])]);
    let lower_triangle = (0..SIZE)
        .flat_map(|row| (0..row).map(move |col| row * SIZE + col))
        .collect();
    let block = def.add_children(
        ChildBlock::array(NON_EQUAL, "nonEqual", vec![SIZE, SIZE]).sparse(lower_triangle),
    );

    def.push(Stmt::set_local(n, Expr::constant(NINE), 12));
    def.push(Stmt::CreateChildren { block });
    let pair = || Address::fixed(0).plus(SIZE, i).plus(1, j);
    let inner = Stmt::for_loop(
        j,
        Expr::constant(ZERO),
        Expr::local(i),
        Expr::constant(ONE),
        vec![
            Stmt::set_child_input(pair(), 0, Expr::signal(Address::fixed(0).plus(1, i)), 18),
            Stmt::set_child_input(pair(), 1, Expr::signal(Address::fixed(0).plus(1, j)), 19),
        ],
        17,
    );
    def.extend(Stmt::for_loop(
        i,
        Expr::constant(ZERO),
        Expr::constant(NINE),
        Expr::constant(ONE),
        inner,
        16,
    ));
    def
}

/// Decomposes `in` into four bits and checks the decomposition is exact,
/// i.e. `0 <= in < 16`.
///
/// Signals: `in`, `bits[4]`.
pub fn bits4_template() -> TemplateDef {
    let (sum, k) = (0, 1);
    let mut def = TemplateDef::new("Bits4", 1, 5).with_locals(2);
    let bit = || Expr::signal(Address::fixed(1).plus(1, k));

    def.push(Stmt::set_local(sum, Expr::constant(ZERO), 28));
    def.extend(Stmt::for_loop(
        k,
        Expr::constant(ZERO),
        Expr::constant(FOUR),
        Expr::constant(ONE),
        vec![
            Stmt::set_signal(
                Address::fixed(1).plus(1, k),
                (Expr::signal(0) >> Expr::local(k)) & Expr::constant(ONE),
                31,
            ),
            Stmt::assert(
                (bit() * (bit() - Expr::constant(ONE))).equals(Expr::constant(ZERO)),
                32,
            ),
            Stmt::set_local(
                sum,
                Expr::local(sum) + Expr::constant(TWO).pow(Expr::local(k)) * bit(),
                33,
            ),
        ],
        30,
    ));
    def.push(Stmt::assert(Expr::local(sum).equals(Expr::signal(0)), 35));
    def
}

/// `1 <= in <= 9`: both `in - 1` and `in + 6` must fit in four bits.
pub fn one_to_nine_template() -> TemplateDef {
    let mut def = TemplateDef::new("OneToNine", 1, 1);
    let lower = def.add_children(ChildBlock::single(BITS4, "lowerBound"));
    let upper = def.add_children(ChildBlock::single(BITS4, "upperBound"));
    def.push(Stmt::CreateChildren { block: lower });
    def.push(Stmt::CreateChildren { block: upper });
    def.push(Stmt::set_child_input(0, 0, Expr::signal(0) - Expr::constant(ONE), 43));
    def.push(Stmt::set_child_input(1, 0, Expr::signal(0) + Expr::constant(SIX), 44));
    def
}

/// Signals: `unsolved[9][9]`, `solved[9][9]`.
pub fn sudoku_template() -> TemplateDef {
    let (n, i, j) = (0, 1, 2);
    let cells = SIZE * SIZE;
    let mut def = TemplateDef::new("Sudoku", 2 * cells, 2 * cells)
        .with_locals(3)
        .with_input_signals(vec![
            InputSignal::new("unsolved", vec![SIZE, SIZE]),
            InputSignal::new("solved", vec![SIZE, SIZE]),
        ]);
    let distinct = def.add_children(ChildBlock::array(DISTINCT, "distinct", vec![SIZE]));
    let in_range = def.add_children(ChildBlock::array(ONE_TO_NINE, "inRange", vec![SIZE, SIZE]));

    let cell = |offset: usize| Address::fixed(offset).plus(SIZE, i).plus(1, j);
    let unsolved = || Expr::signal(cell(0));
    let solved = || Expr::signal(cell(cells));

    def.push(Stmt::set_local(n, Expr::constant(NINE), 50));
    def.push(Stmt::CreateChildren { block: distinct });
    def.push(Stmt::CreateChildren { block: in_range });

    // every given cell must match the solution
    let check = Stmt::for_loop(
        j,
        Expr::constant(ZERO),
        Expr::constant(NINE),
        Expr::constant(ONE),
        vec![Stmt::assert(
            (unsolved() * (unsolved() - solved())).equals(Expr::constant(ZERO)),
            59,
        )],
        57,
    );
    def.extend(Stmt::for_loop(
        i,
        Expr::constant(ZERO),
        Expr::constant(NINE),
        Expr::constant(ONE),
        check,
        56,
    ));

    let feed = Stmt::for_loop(
        j,
        Expr::constant(ZERO),
        Expr::constant(NINE),
        Expr::constant(ONE),
        vec![
            Stmt::set_child_input(cell(SIZE), 0, solved(), 66),
            Stmt::set_child_input(
                Address::fixed(0).plus(1, j),
                Address::fixed(0).plus(1, i),
                solved(),
                67,
            ),
        ],
        64,
    );
    def.extend(Stmt::for_loop(
        i,
        Expr::constant(ZERO),
        Expr::constant(NINE),
        Expr::constant(ONE),
        feed,
        63,
    ));
    def
}

/// Template table shared by every entry point, indexed by the `TemplateId` constants.
pub fn templates() -> Vec<TemplateDef> {
    vec![
        non_equal_template(),
        distinct_template(),
        bits4_template(),
        one_to_nine_template(),
        sudoku_template(),
    ]
}

/// The circuit rooted at `main`, sharing the Sudoku template table and constants.
pub fn circuit_for<F: PrimeField>(main: TemplateId) -> Result<Circuit<F>, CircuitError> {
    Circuit::new(templates(), constants(), main)
}

pub fn circuit<F: PrimeField>() -> Result<Circuit<F>, CircuitError> {
    circuit_for(SUDOKU)
}
