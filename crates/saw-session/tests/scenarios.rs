//! End-to-end behaviour against the in-memory engine.

mod common;

use saw_core::{SawError, Table, Value, Variant};
use saw_session::WriteState;
use saw_transport::SimAutoFunction;

#[test]
fn read_one_returns_typed_trimmed_row() {
    let (mut session, _engine) = common::session();

    let row = session
        .read_one("bus", &["BusNum", "BusName"], &[Variant::Int(1), Variant::Empty])
        .unwrap();

    assert_eq!(row.get("BusNum"), Some(&Value::Int(1)));
    assert_eq!(row.get("BusName"), Some(&Value::Text("One".into())));
}

#[test]
fn silently_refused_write_is_not_respected() {
    let (mut session, engine) = common::session();
    let table = Table::from_rows(
        vec!["BusNum", "GenID", "GenRegPUVolt"],
        vec![vec![Value::Int(1), Value::Text("1".into()), Value::Real(1.05)]],
    )
    .unwrap();

    let err = session.write_many_verified("gen", &table).unwrap_err();

    assert_eq!(engine.calls_to(SimAutoFunction::ChangeParametersMultipleElement), 1);
    match err {
        SawError::CommandNotRespected {
            object_type,
            mismatches,
        } => {
            assert_eq!(object_type, "gen");
            assert_eq!(mismatches.len(), 1);
            assert!(mismatches[0].contains("GenRegPUVolt"));
        }
        other => panic!("expected CommandNotRespected, got {other:?}"),
    }
}

#[test]
fn respected_write_is_confirmed() {
    let (mut session, _engine) = common::session();
    let table = Table::from_rows(
        vec!["BusNum", "GenID", "GenVoltSet"],
        vec![
            vec![Value::Int(3), Value::Text("1".into()), Value::Real(1.01)],
            vec![Value::Int(1), Value::Text("1".into()), Value::Real(1.04)],
        ],
    )
    .unwrap();

    let report = session.write_many_verified("gen", &table).unwrap();
    assert_eq!(report.state, WriteState::Confirmed);
    assert_eq!((report.rows_written, report.rows_compared), (2, 2));

    let gens = session
        .read_many("gen", &["BusNum", "GenID", "GenVoltSet"], "")
        .unwrap()
        .unwrap();
    assert_eq!(gens.value(0, "GenVoltSet"), Some(&Value::Real(1.04)));
}

#[test]
fn type_without_instances_reads_as_absent() {
    let (mut session, _engine) = common::session();

    let shunts = session
        .read_many("shunt", &["BusNum", "ShuntID", "ShuntMW"], "")
        .unwrap();
    assert!(shunts.is_none());
    assert!(session.list_devices("shunt", "").unwrap().is_none());
    assert!(session.get_power_flow_results("shunt").unwrap().is_none());
}

#[test]
fn unknown_field_fails_before_the_write_is_sent() {
    let (mut session, engine) = common::session();
    let table = Table::from_rows(
        vec!["BusNum", "BusPUVolt", "BusVoltageMagic"],
        vec![vec![Value::Int(1), Value::Real(1.0), Value::Real(2.0)]],
    )
    .unwrap();

    let err = session.write_many("bus", &table).unwrap_err();

    match err {
        SawError::UnknownField { object_type, fields } => {
            assert_eq!(object_type, "bus");
            assert_eq!(fields, vec!["BusVoltageMagic".to_string()]);
        }
        other => panic!("expected UnknownField, got {other:?}"),
    }
    assert_eq!(engine.calls_to(SimAutoFunction::ChangeParametersMultipleElement), 0);
}
