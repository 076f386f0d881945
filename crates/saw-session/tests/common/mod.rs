#![allow(dead_code)]

use saw_session::{Session, SessionOptions};
use saw_transport::{FieldSpec, MemoryCase, MemoryEngine, ObjectData};

pub const CASE_PATH: &str = "C:/cases/three_bus.pwb";

/// Three buses, two generators, one load, one branch and no shunts.
pub fn three_bus_case() -> MemoryCase {
    let bus = ObjectData::new(vec![
        FieldSpec::new("BusNum", "Integer").key("*1*").described("Number"),
        FieldSpec::new("BusName", "String").described("Name"),
        FieldSpec::new("BusPUVolt", "Real").described("Per-unit voltage magnitude"),
        FieldSpec::new("BusAngle", "Real"),
        FieldSpec::new("BusNetMW", "Real"),
        FieldSpec::new("BusNetMVR", "Real"),
    ])
    .with_record(vec![
        ("BusNum", saw_core::Variant::Int(3)),
        ("BusName", "Three   ".into()),
        ("BusPUVolt", 0.98.into()),
        ("BusAngle", (-2.5).into()),
        ("BusNetMW", (-90.0).into()),
        ("BusNetMVR", (-30.0).into()),
    ])
    .with_record(vec![
        ("BusNum", saw_core::Variant::Int(1)),
        ("BusName", "  One".into()),
        ("BusPUVolt", 1.02.into()),
        ("BusAngle", 0.0.into()),
        ("BusNetMW", 150.0.into()),
        ("BusNetMVR", 40.0.into()),
    ])
    .with_record(vec![
        ("BusNum", saw_core::Variant::Int(2)),
        ("BusName", "Two".into()),
        ("BusPUVolt", 1.0.into()),
        ("BusAngle", (-1.2).into()),
        ("BusNetMW", (-60.0).into()),
        ("BusNetMVR", (-10.0).into()),
    ]);

    let gen = ObjectData::new(vec![
        FieldSpec::new("BusNum", "Integer").key("*1*"),
        FieldSpec::new("GenID", "String").key("*2*"),
        FieldSpec::new("GenMW", "Real"),
        FieldSpec::new("GenMVR", "Real"),
        FieldSpec::new("GenVoltSet", "Real"),
        FieldSpec::new("GenRegPUVolt", "Real").read_only(),
    ])
    .with_record(vec![
        ("BusNum", saw_core::Variant::Int(1)),
        ("GenID", "1".into()),
        ("GenMW", 100.0.into()),
        ("GenMVR", 25.0.into()),
        ("GenVoltSet", 1.02.into()),
        ("GenRegPUVolt", 1.02.into()),
    ])
    .with_record(vec![
        ("BusNum", saw_core::Variant::Int(3)),
        ("GenID", "1".into()),
        ("GenMW", 50.0.into()),
        ("GenMVR", 5.0.into()),
        ("GenVoltSet", 1.0.into()),
        ("GenRegPUVolt", 1.0.into()),
    ]);

    let load = ObjectData::new(vec![
        FieldSpec::new("BusNum", "Integer").key("*1*"),
        FieldSpec::new("LoadID", "String").key("*2*"),
        FieldSpec::new("LoadMW", "Real"),
        FieldSpec::new("LoadMVR", "Real"),
    ])
    .with_record(vec![
        ("BusNum", saw_core::Variant::Int(2)),
        ("LoadID", "1".into()),
        ("LoadMW", 60.0.into()),
        ("LoadMVR", 10.0.into()),
    ]);

    let shunt = ObjectData::new(vec![
        FieldSpec::new("BusNum", "Integer").key("*1*"),
        FieldSpec::new("ShuntID", "String").key("*2*"),
        FieldSpec::new("ShuntMW", "Real"),
        FieldSpec::new("ShuntMVR", "Real"),
    ]);

    let branch = ObjectData::new(vec![
        FieldSpec::new("BusNum", "Integer").key("*1*"),
        FieldSpec::new("BusNum:1", "Integer").key("*2*"),
        FieldSpec::new("LineCircuit", "String").key("*3*"),
        FieldSpec::new("LineMW", "Real"),
        FieldSpec::new("LineMW:1", "Real"),
        FieldSpec::new("LineMVR", "Real"),
        FieldSpec::new("LineMVR:1", "Real"),
    ])
    .with_record(vec![
        ("BusNum", saw_core::Variant::Int(1)),
        ("BusNum:1", saw_core::Variant::Int(2)),
        ("LineCircuit", "1".into()),
        ("LineMW", 50.0.into()),
        ("LineMW:1", (-49.5).into()),
        ("LineMVR", 12.0.into()),
        ("LineMVR:1", (-11.0).into()),
    ]);

    MemoryCase::new()
        .with_header("Three bus test system")
        .with_header("Memory engine fixture")
        .with_object("bus", bus)
        .with_object("gen", gen)
        .with_object("load", load)
        .with_object("shunt", shunt)
        .with_object("branch", branch)
}

pub fn engine() -> MemoryEngine {
    let engine = MemoryEngine::new();
    engine.register_case(CASE_PATH, three_bus_case());
    engine
}

/// A session over a fresh engine, with the engine handle kept for inspection.
pub fn session_with(options: SessionOptions) -> (Session, MemoryEngine) {
    let engine = engine();
    let session = Session::with_transport(Box::new(engine.clone()), options)
        .expect("session starts over the memory engine");
    (session, engine)
}

pub fn session() -> (Session, MemoryEngine) {
    session_with(SessionOptions::new(CASE_PATH).prewarm(["bus", "gen"]))
}
