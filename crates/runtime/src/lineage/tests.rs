use mtx_foundation::{MatrixBlock, ScalarValue, Value, ValueType};

use super::*;
use crate::opcode::NaryOpcode;
use crate::operand::Operand;

fn block(v: f64) -> Value {
    Value::Matrix(MatrixBlock::filled(1, 2, v))
}

fn inputs_ab() -> LineageMap {
    let mut map = LineageMap::new();
    map.set_input("A", &block(1.0));
    map.set_input("B", &block(2.0));
    map
}

fn nmax(output: &str) -> Instruction {
    Instruction::new(
        NaryOpcode::NMAX,
        vec![
            Operand::matrix("A", ValueType::Fp64),
            Operand::matrix("B", ValueType::Fp64),
            Operand::literal(ScalarValue::Int64(3)),
        ],
        Operand::matrix(output, ValueType::Fp64),
    )
}

#[test]
fn records_opcode_inputs_and_output_name() {
    let map = inputs_ab();
    let record = record_lineage(&nmax("C"), &map).unwrap();
    let item = &record.item;

    assert_eq!(item.name(), "C");
    assert_eq!(item.opcode(), "nmax");
    assert_eq!(item.inputs().len(), 3);
    assert_eq!(item.inputs()[0], map.get("A").unwrap().id());
    assert_eq!(item.inputs()[1], map.get("B").unwrap().id());

    assert_eq!(record.literals.len(), 1);
    let lit = &record.literals[0];
    assert_eq!(item.inputs()[2], lit.id());
    assert_eq!(lit.opcode(), OPCODE_LITERAL);
    assert_eq!(lit.data(), Some("3·INT64"));
    assert!(lit.is_leaf());
}

#[test]
fn equivalent_across_output_names() {
    let map = inputs_ab();
    let c = record_lineage(&nmax("C"), &map).unwrap().item;
    let d = record_lineage(&nmax("D"), &map).unwrap().item;

    assert_ne!(c.name(), d.name());
    assert_ne!(c, d);
    assert_eq!(c.id(), d.id());
    assert!(c.is_equivalent(&d));
}

#[test]
fn different_inputs_not_equivalent() {
    let map = inputs_ab();
    let ab = record_lineage(&nmax("C"), &map).unwrap().item;

    let swapped = Instruction::new(
        NaryOpcode::NMAX,
        vec![
            Operand::matrix("B", ValueType::Fp64),
            Operand::matrix("A", ValueType::Fp64),
            Operand::literal(ScalarValue::Int64(3)),
        ],
        Operand::matrix("C", ValueType::Fp64),
    );
    let ba = record_lineage(&swapped, &map).unwrap().item;
    assert!(!ab.is_equivalent(&ba));

    let other_literal = Instruction::new(
        NaryOpcode::NMAX,
        vec![
            Operand::matrix("A", ValueType::Fp64),
            Operand::matrix("B", ValueType::Fp64),
            Operand::literal(ScalarValue::Fp64(3.0)),
        ],
        Operand::matrix("C", ValueType::Fp64),
    );
    let lit = record_lineage(&other_literal, &map).unwrap().item;
    assert!(!ab.is_equivalent(&lit));
}

#[test]
fn independently_built_maps_agree() {
    let c1 = record_lineage(&nmax("C"), &inputs_ab()).unwrap().item;
    let c2 = record_lineage(&nmax("C"), &inputs_ab()).unwrap().item;
    assert!(c1.is_equivalent(&c2));
}

#[test]
fn creation_leaves_track_name_and_value() {
    let a = LineageItem::creation("A", &block(1.0));
    assert!(a.is_equivalent(&LineageItem::creation("A", &block(1.0))));
    assert!(!a.is_equivalent(&LineageItem::creation("B", &block(1.0))));
    assert!(!a.is_equivalent(&LineageItem::creation("A", &block(3.0))));
    assert!(a.data().unwrap().starts_with("A·"));
}

#[test]
fn rebound_input_changes_downstream_id() {
    let mut map = inputs_ab();
    let before = record_lineage(&nmax("C"), &map).unwrap().item;
    map.set_input("A", &block(9.0));
    let after = record_lineage(&nmax("C"), &map).unwrap().item;
    assert_ne!(before.id(), after.id());
    assert!(!before.is_equivalent(&after));
}

#[test]
fn missing_input_lineage_is_unbound() {
    let mut map = LineageMap::new();
    map.set_input("A", &block(1.0));
    let err = record_lineage(&nmax("C"), &map).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::UnboundVariable {
            name: "B".into(),
            index: 1
        }
    );
}

#[test]
fn arena_stores_shared_nodes_once() {
    let mut map = inputs_ab();
    let record = record_lineage(&nmax("C"), &map).unwrap();
    let c = map.insert(record);
    let record = record_lineage(&nmax("D"), &map).unwrap();
    let d = map.insert(record);

    assert_eq!(c, d);
    assert_eq!(map.len(), 4);
    // A, B, the literal and one nmax node.
    assert_eq!(map.node_count(), 4);
    assert_eq!(map.get("D").unwrap().name(), "C");
}

#[test]
fn explain_prints_shared_nodes_once_in_post_order() {
    let mut map = inputs_ab();
    let record = record_lineage(&nmax("C"), &map).unwrap();
    let c = map.insert(record);

    let cbind = Instruction::new(
        NaryOpcode::CBIND,
        vec![
            Operand::matrix("C", ValueType::Fp64),
            Operand::matrix("A", ValueType::Fp64),
        ],
        Operand::matrix("E", ValueType::Fp64),
    );
    let record = record_lineage(&cbind, &map).unwrap();
    let e = map.insert(record);

    let trace = map.explain_var("E").unwrap();
    let lines: Vec<&str> = trace.lines().collect();
    assert_eq!(lines.len(), 5, "{trace}");

    let a_id = map.get("A").unwrap().id();
    assert!(lines[0].starts_with(&format!("({a_id}) (read) A·")));
    assert!(lines[2].contains("(lit) 3·INT64"));
    assert!(lines[3].starts_with(&format!("({c}) (nmax)")));
    assert_eq!(lines[4], format!("({e}) (cbind) ({c}) ({a_id})"));

    assert_eq!(map.explain(e), Some(trace.clone()));
    assert_eq!(map.explain(LineageId(0)), None);
}

#[test]
fn remove_keeps_nodes() {
    let mut map = inputs_ab();
    let a = map.get("A").unwrap().id();
    let record = record_lineage(&nmax("C"), &map).unwrap();
    let c = map.insert(record);

    assert_eq!(map.remove("A"), Some(a));
    assert!(!map.contains("A"));
    assert_eq!(map.len(), 2);
    assert!(map.node(a).is_some());
    assert_eq!(map.node(c).unwrap().inputs()[0], a);
    assert!(map.explain(c).unwrap().contains("(read) A·"));

    assert!(map.alias("A2", a));
    assert!(!map.alias("nope", LineageId(1)));
}

fn nmax_literal(text: &str) -> Instruction {
    format!("CP°nmax°A·MATRIX·FP64°{text}·SCALAR·FP64·true°C·MATRIX·FP64")
        .parse()
        .unwrap()
}

#[test]
fn literals_compare_by_value() {
    let map = inputs_ab();
    let three = record_lineage(&nmax_literal("3"), &map).unwrap();
    let three_point_zero = record_lineage(&nmax_literal("3.0"), &map).unwrap();
    let four = record_lineage(&nmax_literal("4"), &map).unwrap();

    assert!(three.item.is_equivalent(&three_point_zero.item));
    assert_eq!(three_point_zero.literals[0].data(), Some("3·FP64"));
    assert!(!three.item.is_equivalent(&four.item));
}

#[test]
fn invalid_literal_fails_recording() {
    let map = inputs_ab();
    let err = record_lineage(&nmax_literal("three"), &map).unwrap_err();
    assert_eq!(err.operand_index(), Some(1));
    assert!(matches!(err, ExecutionError::InvalidLiteral { .. }));
}

#[test]
fn explain_handles_deep_chains() {
    const DEPTH: usize = 100_000;
    let mut map = LineageMap::new();
    map.set_input("x", &block(0.0));
    for i in 0..DEPTH {
        let step = Instruction::new(
            NaryOpcode::NMAX,
            vec![
                Operand::matrix("x", ValueType::Fp64),
                Operand::literal(ScalarValue::Int64(i as i64)),
            ],
            Operand::matrix("x", ValueType::Fp64),
        );
        let record = record_lineage(&step, &map).unwrap();
        map.insert(record);
    }
    // Every step stays reachable from `x`.
    assert_eq!(map.node_count(), 2 * DEPTH + 1);

    let trace = map.explain_var("x").unwrap();
    let lines: Vec<&str> = trace.lines().collect();
    assert_eq!(lines.len(), 2 * DEPTH + 1);
    assert!(lines[0].contains("(read) x·"));
    assert!(lines[1].contains("(lit) 0·INT64"));
    assert!(lines[lines.len() - 1].contains("(nmax)"));

    map.set_input("x", &block(1.0));
    map.retain_reachable();
    assert_eq!(map.node_count(), 1);
}

#[test]
fn rebinding_loop_keeps_arena_bounded() {
    let mut map = inputs_ab();
    let cbind = Instruction::new(
        NaryOpcode::CBIND,
        vec![
            Operand::matrix("A", ValueType::Fp64),
            Operand::matrix("B", ValueType::Fp64),
        ],
        Operand::matrix("C", ValueType::Fp64),
    );

    for i in 0..5 * COLLECT_THRESHOLD {
        map.set_input("A", &block(i as f64));
        let record = record_lineage(&cbind, &map).unwrap();
        map.insert(record);
        assert!(map.node_count() <= COLLECT_THRESHOLD, "{}", map.node_count());
    }

    map.retain_reachable();
    // A, B and C.
    assert_eq!(map.node_count(), 3);
    assert!(map.explain_var("C").unwrap().contains("(cbind)"));
}

#[test]
fn remove_then_collect_drops_private_nodes() {
    let mut map = inputs_ab();
    let record = record_lineage(&nmax("C"), &map).unwrap();
    map.insert(record);
    assert_eq!(map.node_count(), 4);

    map.remove("C");
    assert_eq!(map.retain_reachable(), 2);
    assert_eq!(map.node_count(), 2);
    assert!(map.get("A").is_some() && map.get("B").is_some());
}
