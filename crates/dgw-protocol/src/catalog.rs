// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compile-time tool/resource catalog (§9: a hashmap lookup over a static
//! table, not dynamic dispatch by string name).

use dgw_core::{ResourceDescriptor, Role, ToolDescriptor};
use std::sync::LazyLock;

fn drone_id_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": { "drone_id": { "type": "string", "minLength": 1 } },
        "required": ["drone_id"],
        "additionalProperties": false,
    })
}

fn optional_drone_id_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": { "drone_id": { "type": ["string", "null"] } },
        "additionalProperties": false,
    })
}

static TOOLS: LazyLock<Vec<ToolDescriptor>> = LazyLock::new(|| {
    vec![
        ToolDescriptor {
            name: "connect_drone",
            input_schema: drone_id_schema(),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "disconnect_drone",
            input_schema: drone_id_schema(),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "takeoff",
            input_schema: drone_id_schema(),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "land",
            input_schema: drone_id_schema(),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "move",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "drone_id": { "type": "string", "minLength": 1 },
                    "direction": { "enum": ["forward", "back", "left", "right", "up", "down"] },
                    "distance_cm": { "type": "integer", "minimum": 20, "maximum": 500 },
                },
                "required": ["drone_id", "direction", "distance_cm"],
                "additionalProperties": false,
            }),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "rotate",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "drone_id": { "type": "string", "minLength": 1 },
                    "rotation_direction": { "enum": ["clockwise", "counter_clockwise"] },
                    "angle_deg": { "type": "integer", "minimum": 1, "maximum": 360 },
                },
                "required": ["drone_id", "rotation_direction", "angle_deg"],
                "additionalProperties": false,
            }),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "take_photo",
            input_schema: drone_id_schema(),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "execute_natural_language_command",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "minLength": 1, "maxLength": 4096 },
                    "drone_id": { "type": ["string", "null"] },
                },
                "required": ["text"],
                "additionalProperties": false,
            }),
            min_role: Role::Operator,
        },
        ToolDescriptor {
            name: "emergency_stop",
            input_schema: optional_drone_id_schema(),
            min_role: Role::Operator,
        },
    ]
});

static RESOURCES: LazyLock<Vec<ResourceDescriptor>> = LazyLock::new(|| {
    vec![
        ResourceDescriptor {
            uri: "drones://list",
            name: "drones_list",
            description: "Last known status snapshot for every tracked drone",
            min_role: Role::Readonly,
        },
        ResourceDescriptor {
            uri: "system://status",
            name: "system_status",
            description: "JSON dump of monitoring counters/gauges/histograms",
            min_role: Role::Readonly,
        },
        ResourceDescriptor {
            uri: "system://health",
            name: "system_health",
            description: "Threat-analysis summary and server lifecycle state",
            min_role: Role::Operator,
        },
        ResourceDescriptor {
            uri: "metrics://prometheus",
            name: "metrics_prometheus",
            description: "Prometheus text-exposition-format metrics scrape endpoint",
            min_role: Role::Readonly,
        },
    ]
});

/// Static accessors over the compile-time tool/resource catalog.
pub struct Catalog;

impl Catalog {
    /// All registered tools, in declaration order.
    #[must_use]
    pub fn tools() -> &'static [ToolDescriptor] {
        &TOOLS
    }

    /// All registered resources, in declaration order.
    #[must_use]
    pub fn resources() -> &'static [ResourceDescriptor] {
        &RESOURCES
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn tool(name: &str) -> Option<&'static ToolDescriptor> {
        TOOLS.iter().find(|t| t.name == name)
    }

    /// Look up a resource by URI.
    #[must_use]
    pub fn resource(uri: &str) -> Option<&'static ResourceDescriptor> {
        RESOURCES.iter().find(|r| r.uri == uri)
    }
}
