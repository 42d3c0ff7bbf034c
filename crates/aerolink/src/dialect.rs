//! Built-in subset of the common telemetry dialect.
//!
//! A hand-maintained selection of well-known messages, enough for the
//! diagnostics CLI and for exercising a link without an external
//! definition loader. Crc-extra seeds match the published dialect so
//! frames interoperate with stock peers.

use aerolink_schema::{MessageDefinitionBuilder, MessageSet, SchemaError, WireType};

/// Build the built-in message set.
pub fn standard() -> Result<MessageSet, SchemaError> {
    let mut builder = MessageSet::builder();

    builder.add(
        MessageDefinitionBuilder::new(0, "HEARTBEAT")
            .crc_extra(50)
            .field("type", WireType::U8)
            .field("autopilot", WireType::U8)
            .field("base_mode", WireType::U8)
            .field("custom_mode", WireType::U32)
            .field("system_status", WireType::U8)
            .field("mavlink_version", WireType::U8)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(1, "SYS_STATUS")
            .crc_extra(124)
            .field("onboard_control_sensors_present", WireType::U32)
            .field("onboard_control_sensors_enabled", WireType::U32)
            .field("onboard_control_sensors_health", WireType::U32)
            .field("load", WireType::U16)
            .field("voltage_battery", WireType::U16)
            .field("current_battery", WireType::I16)
            .field("battery_remaining", WireType::I8)
            .field("drop_rate_comm", WireType::U16)
            .field("errors_comm", WireType::U16)
            .field("errors_count1", WireType::U16)
            .field("errors_count2", WireType::U16)
            .field("errors_count3", WireType::U16)
            .field("errors_count4", WireType::U16)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(2, "SYSTEM_TIME")
            .crc_extra(137)
            .field("time_unix_usec", WireType::U64)
            .field("time_boot_ms", WireType::U32)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(4, "PING")
            .crc_extra(237)
            .field("time_usec", WireType::U64)
            .field("seq", WireType::U32)
            .field("target_system", WireType::U8)
            .field("target_component", WireType::U8)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(22, "PARAM_VALUE")
            .crc_extra(220)
            .field("param_value", WireType::F32)
            .field("param_count", WireType::U16)
            .field("param_index", WireType::U16)
            .array("param_id", WireType::Char, 16)
            .field("param_type", WireType::U8)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(30, "ATTITUDE")
            .crc_extra(39)
            .field("time_boot_ms", WireType::U32)
            .field("roll", WireType::F32)
            .field("pitch", WireType::F32)
            .field("yaw", WireType::F32)
            .field("rollspeed", WireType::F32)
            .field("pitchspeed", WireType::F32)
            .field("yawspeed", WireType::F32)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(33, "GLOBAL_POSITION_INT")
            .crc_extra(104)
            .field("time_boot_ms", WireType::U32)
            .field("lat", WireType::I32)
            .field("lon", WireType::I32)
            .field("alt", WireType::I32)
            .field("relative_alt", WireType::I32)
            .field("vx", WireType::I16)
            .field("vy", WireType::I16)
            .field("vz", WireType::I16)
            .field("hdg", WireType::U16)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(76, "COMMAND_LONG")
            .crc_extra(152)
            .field("target_system", WireType::U8)
            .field("target_component", WireType::U8)
            .field("command", WireType::U16)
            .field("confirmation", WireType::U8)
            .field("param1", WireType::F32)
            .field("param2", WireType::F32)
            .field("param3", WireType::F32)
            .field("param4", WireType::F32)
            .field("param5", WireType::F32)
            .field("param6", WireType::F32)
            .field("param7", WireType::F32)
            .build()?,
    )?;

    builder.add(
        MessageDefinitionBuilder::new(77, "COMMAND_ACK")
            .crc_extra(143)
            .field("command", WireType::U16)
            .field("result", WireType::U8)
            .extension("progress", WireType::U8)
            .extension("result_param2", WireType::I32)
            .extension("target_system", WireType::U8)
            .extension("target_component", WireType::U8)
            .build()?,
    )?;

    Ok(builder.build())
}
