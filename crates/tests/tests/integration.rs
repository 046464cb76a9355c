//! Integration tests for end-to-end instruction execution.
//!
//! These tests drive the full pipeline through the runtime facade:
//! Bind inputs → Parse → Execute → Verify values, pins and lineage.

use std::thread;

use mtx_foundation::{MatrixBlock, ScalarValue, Value, ValueType};
use mtx_runtime::{
    ExecutionContext, ExecutionError, Instruction, LineageMode, NaryOpcode, Operand,
    ShapeRequirement,
};
use mtx_tests::{run_program, TestHarness};
use rayon::prelude::*;

fn harness(mode: LineageMode) -> TestHarness {
    let h = TestHarness::new(mode);
    h.matrix("A", &[&[1.0, 5.0]])
        .matrix("B", &[&[4.0, 2.0]])
        .matrix("X", &[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]])
        .matrix("Y", &[&[0.0; 3], &[0.0; 3], &[0.0; 3]])
        .matrix("Z", &[&[7.0, 8.0, 9.0]]);
    h
}

#[test]
fn nmax_nmin_broadcast_scalar_literal() {
    let h = harness(LineageMode::Reuse);

    h.exec("CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°3·SCALAR·INT64·true°C·MATRIX·FP64");
    h.exec("CP°nmin°A·MATRIX·FP64°B·MATRIX·FP64°3·SCALAR·INT64·true°D·MATRIX·FP64");

    assert_eq!(h.get_matrix("C"), Some(MatrixBlock::from_rows(&[[4.0, 5.0]])));
    assert_eq!(h.get_matrix("D"), Some(MatrixBlock::from_rows(&[[1.0, 2.0]])));
    h.assert_unpinned();
}

#[test]
fn cbind_rbind_shape_law() {
    let h = harness(LineageMode::Trace);

    h.matrix("W", &[&[1.0], &[2.0]]);
    let c = h.exec("CP°cbind°X·MATRIX·FP64°W·MATRIX·FP64°X·MATRIX·FP64°C·MATRIX·FP64");
    assert_eq!(c.as_matrix().unwrap().shape(), (2, 3 + 1 + 3));
    assert_eq!(
        c.as_matrix().unwrap().row(1),
        &[4.0, 5.0, 6.0, 2.0, 4.0, 5.0, 6.0]
    );

    let r = h.exec("CP°rbind°X·MATRIX·FP64°Z·MATRIX·FP64°Y·MATRIX·FP64°R·MATRIX·FP64");
    let r = r.as_matrix().unwrap();
    assert_eq!(r.shape(), (2 + 1 + 3, 3));
    assert_eq!(r.row(2), &[7.0, 8.0, 9.0]);

    // A single input is the identity.
    let single = h.exec("CP°rbind°Z·MATRIX·FP64°S·MATRIX·FP64");
    assert_eq!(single.as_matrix(), h.get_matrix("Z").as_ref());
}

#[test]
fn cbind_dimension_mismatch() {
    let h = harness(LineageMode::Reuse);

    let err = h
        .try_exec("CP°cbind°X·MATRIX·FP64°Y·MATRIX·FP64°C·MATRIX·FP64")
        .unwrap_err();
    assert_eq!(
        err,
        ExecutionError::DimensionMismatch {
            opcode: NaryOpcode::CBIND,
            index: 1,
            expected: ShapeRequirement::Rows(2),
            found: (3, 3),
        }
    );
    assert_eq!(h.library_calls(), 0);
    assert!(h.get("C").is_none());
    assert!(h.lineage("C").is_none());
    h.assert_unpinned();
}

#[test]
fn scalar_output_coercion() {
    let h = harness(LineageMode::Reuse);
    h.scalar("k", ScalarValue::Fp64(2.9));

    let v = h.exec("CP°nmax°k·SCALAR·FP64°-1·SCALAR·INT64·true°y·SCALAR·INT64");
    assert_eq!(v, Value::Scalar(ScalarValue::Int64(2)));

    let v = h.exec("CP°nmin°k·SCALAR·FP64°y·SCALAR·INT64°b·SCALAR·BOOLEAN");
    assert_eq!(v, Value::Scalar(ScalarValue::Boolean(true)));

    let err = h
        .try_exec("CP°nmax°A·MATRIX·FP64°k·SCALAR·FP64°s·SCALAR·FP64")
        .unwrap_err();
    assert!(matches!(err, ExecutionError::InvalidOutputShape { found: (1, 2), .. }));
    assert!(h.get("s").is_none());
}

#[test]
fn lineage_equivalent_across_output_names() {
    let h = harness(LineageMode::Trace);

    h.exec("CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°3·SCALAR·INT64·true°C·MATRIX·FP64");
    h.exec("CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°3·SCALAR·INT64·true°D·MATRIX·FP64");
    let c = h.lineage("C").unwrap();
    let d = h.lineage("D").unwrap();

    // Both names point at the one node recorded first.
    assert_eq!(c.name(), "C");
    assert_eq!(d.name(), "C");
    assert_eq!(c.id(), d.id());
    assert!(c.is_equivalent(&d));
    assert_eq!(h.explain("C"), h.explain("D"));
}

#[test]
fn unknown_opcode_leaves_context_unchanged() {
    let h = harness(LineageMode::Reuse);
    let before = h.runtime().context().names();

    let err = h
        .try_exec("CP°zzz°A·MATRIX·FP64°B·MATRIX·FP64°A·MATRIX·FP64")
        .unwrap_err();
    assert_eq!(
        err,
        ExecutionError::UnknownOpcode {
            opcode: "zzz".into()
        }
    );
    assert!(err.is_fatal());
    assert_eq!(h.runtime().context().names(), before);
    assert_eq!(h.get_matrix("A"), Some(MatrixBlock::from_rows(&[[1.0, 5.0]])));
    assert_eq!(h.library_calls(), 0);
}

#[test]
fn reuse_hit_skips_library() {
    let h = harness(LineageMode::Reuse);

    let c = h.exec("CP°cbind°A·MATRIX·FP64°B·MATRIX·FP64°C·MATRIX·FP64");
    assert_eq!(h.library_calls(), 1);
    let d = h.exec("CP°cbind°A·MATRIX·FP64°B·MATRIX·FP64°D·MATRIX·FP64");
    assert_eq!(h.library_calls(), 1);
    assert!(c.bit_eq(&d));

    // Rebinding an input changes its lineage, so the next run computes.
    h.matrix("A", &[&[0.0, 0.0]]);
    let e = h.exec("CP°cbind°A·MATRIX·FP64°B·MATRIX·FP64°E·MATRIX·FP64");
    assert_eq!(h.library_calls(), 2);
    assert!(!c.bit_eq(&e));
    assert_eq!(h.runtime().cache_stats().hits, 1);
}

#[test]
fn reuse_results_match_fresh_execution() {
    let program = [
        "CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°1·SCALAR·FP64·true°C·MATRIX·FP64",
        "CP°nmin°C·MATRIX·FP64°A·MATRIX·FP64°D·MATRIX·FP64",
        "CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°1·SCALAR·FP64·true°E·MATRIX·FP64",
        "CP°rbind°C·MATRIX·FP64°D·MATRIX·FP64°E·MATRIX·FP64°F·MATRIX·FP64",
        "CP°cbind°F·MATRIX·FP64°F·MATRIX·FP64°G·MATRIX·FP64",
    ];
    let reuse = harness(LineageMode::Reuse);
    let fresh = harness(LineageMode::Disabled);
    for inst in program {
        let a = reuse.exec(inst);
        let b = fresh.exec(inst);
        assert!(a.bit_eq(&b), "{inst}");
    }
    assert!(reuse.library_calls() < fresh.library_calls());
}

#[test]
fn pins_balanced_on_every_path() {
    let h = harness(LineageMode::Disabled);
    let attempts = [
        "CP°cbind°A·MATRIX·FP64°B·MATRIX·FP64°C·MATRIX·FP64",
        "CP°cbind°A·MATRIX·FP64°X·MATRIX·FP64°C·MATRIX·FP64",
        "CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°nope·MATRIX·FP64°C·MATRIX·FP64",
        "CP°nmax°A·MATRIX·FP64°oops·SCALAR·INT64·true°C·MATRIX·FP64",
        "CP°nmax°A·MATRIX·FP64°X·MATRIX·FP64°C·MATRIX·FP64",
        "CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°C·SCALAR·FP64",
        "CP°rbind°A·MATRIX·FP64°A·SCALAR·FP64°C·MATRIX·FP64",
        "CP°nmin°A·SCALAR·FP64°C·MATRIX·FP64",
    ];
    for inst in attempts {
        let _ = h.try_exec(inst);
        h.assert_unpinned();
    }
}

#[test]
fn rebind_while_pinned_keeps_old_value_readable() {
    let ctx = ExecutionContext::new();
    ctx.set_variable("A", Value::Matrix(MatrixBlock::from_rows(&[[1.0, 5.0]])));

    let pinned = ctx
        .resolve_matrices(&[Operand::matrix("A", ValueType::Fp64)])
        .unwrap();
    assert_eq!(ctx.pin_count("A"), Some(1));

    ctx.set_variable("A", Value::Matrix(MatrixBlock::from_rows(&[[9.0, 9.0]])));
    assert_eq!(ctx.pin_count("A"), Some(0));
    assert_eq!(pinned.blocks()[0], &MatrixBlock::from_rows(&[[1.0, 5.0]]));

    ctx.release_matrices(pinned);
    assert_eq!(
        ctx.get("A"),
        Some(Value::Matrix(MatrixBlock::from_rows(&[[9.0, 9.0]])))
    );
}

#[test]
fn instruction_codec_round_trips() {
    let inst = Instruction::new(
        NaryOpcode::NMIN,
        vec![
            Operand::matrix("A", ValueType::Fp64),
            Operand::scalar("k", ValueType::Int32),
            Operand::literal(ScalarValue::Fp64(-0.5)),
        ],
        Operand::matrix("C", ValueType::Fp64),
    );
    let text = inst.to_string();
    assert_eq!(text.parse::<Instruction>().unwrap(), inst);

    let json = serde_json::to_string(&inst).unwrap();
    let back: Instruction = serde_json::from_str(&json).unwrap();
    assert_eq!(back, inst);
}

#[test]
fn parallel_execution_shares_inputs() {
    let h = harness(LineageMode::Reuse);

    let outputs: Vec<String> = (0..64).map(|i| format!("out{i}")).collect();
    outputs.par_iter().enumerate().for_each(|(i, name)| {
        let inst = if i % 2 == 0 {
            format!("CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°{name}·MATRIX·FP64")
        } else {
            format!("CP°cbind°X·MATRIX·FP64°X·MATRIX·FP64°{name}·MATRIX·FP64")
        };
        h.exec(&inst);
    });

    for (i, name) in outputs.iter().enumerate() {
        let m = h.get_matrix(name).unwrap();
        if i % 2 == 0 {
            assert_eq!(m, MatrixBlock::from_rows(&[[4.0, 5.0]]));
        } else {
            assert_eq!(m.shape(), (2, 6));
        }
    }
    h.assert_unpinned();
    let stats = h.runtime().cache_stats();
    assert_eq!(stats.lookups(), 64);
    assert!(h.library_calls() >= 2);
}

#[test]
fn readers_race_a_rebinding_writer() {
    let h = harness(LineageMode::Disabled);

    thread::scope(|s| {
        for t in 0..4 {
            let h = &h;
            s.spawn(move || {
                for i in 0..50 {
                    let inst = format!("CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°r{t}_{i}·MATRIX·FP64");
                    let value = h.exec(&inst);
                    let m = value.as_matrix().unwrap();
                    // A is either the original or the rebound all-zero block.
                    assert!(
                        m == &MatrixBlock::from_rows(&[[4.0, 5.0]])
                            || m == &MatrixBlock::from_rows(&[[4.0, 2.0]])
                    );
                }
            });
        }
        s.spawn(|| {
            for i in 0..50 {
                let row = if i % 2 == 0 { [0.0, 0.0] } else { [1.0, 5.0] };
                h.matrix("A", &[&row]);
            }
        });
    });

    h.assert_unpinned();
}

#[test]
fn json_program_end_to_end() {
    let report = run_program(
        r#"{
            "config": { "lineage": "reuse" },
            "inputs": {
                "A": { "matrix": { "rows": 1, "cols": 2, "data": [1.0, 5.0] } },
                "B": { "matrix": { "rows": 1, "cols": 2, "data": [4.0, 2.0] } }
            },
            "instructions": [
                "CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°3·SCALAR·INT64·true°C·MATRIX·FP64",
                "CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°3·SCALAR·INT64·true°D·MATRIX·FP64"
            ],
            "outputs": ["C", "D"]
        }"#,
    );
    assert_eq!(report.executed, 2);
    assert_eq!(report.cache.hits, 1);
    assert_eq!(report.outputs["C"], report.outputs["D"]);
    assert_eq!(
        report.outputs["C"],
        Value::Matrix(MatrixBlock::from_rows(&[[4.0, 5.0]]))
    );
}
