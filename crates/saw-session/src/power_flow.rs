use saw_core::ObjectType;

/// Fields returned by `Session::get_power_flow_results`, per object type.
pub const POWER_FLOW_FIELDS: [(&str, &[&str]); 5] = [
    (
        "bus",
        &[
            "BusNum",
            "BusName",
            "BusPUVolt",
            "BusAngle",
            "BusNetMW",
            "BusNetMVR",
        ],
    ),
    ("gen", &["BusNum", "GenID", "GenMW", "GenMVR"]),
    ("load", &["BusNum", "LoadID", "LoadMW", "LoadMVR"]),
    ("shunt", &["BusNum", "ShuntID", "ShuntMW", "ShuntMVR"]),
    (
        "branch",
        &[
            "BusNum",
            "BusNum:1",
            "LineCircuit",
            "LineMW",
            "LineMW:1",
            "LineMVR",
            "LineMVR:1",
        ],
    ),
];

pub fn power_flow_fields(object_type: &ObjectType) -> Option<&'static [&'static str]> {
    POWER_FLOW_FIELDS
        .iter()
        .find(|(name, _)| *name == object_type.as_str())
        .map(|(_, fields)| *fields)
}

pub fn supported_types() -> Vec<&'static str> {
    POWER_FLOW_FIELDS.iter().map(|(name, _)| *name).collect()
}
