use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::cmd::InfoArgs;
use crate::exit::{self, CliResult};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct MessageInfo {
    id: u32,
    name: String,
    payload_size: usize,
    crc_extra: u8,
    fields: usize,
    extensions: usize,
}

pub fn run(_args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let set = aerolink::dialect::standard()
        .map_err(|err| exit::schema_error("building dialect", err))?;

    let mut rows = Vec::new();
    for id in set.ids() {
        let def = set
            .definition(id)
            .map_err(|err| exit::schema_error("looking up definition", err))?;
        rows.push(MessageInfo {
            id,
            name: def.name().to_string(),
            payload_size: def.max_payload_size(),
            crc_extra: def.crc_extra(),
            fields: def.fields().len(),
            extensions: def.fields().iter().filter(|f| f.is_extension()).count(),
        });
    }

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        _ => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "PAYLOAD", "CRC_EXTRA", "FIELDS", "EXT"]);
            for row in &rows {
                table.add_row(vec![
                    row.id.to_string(),
                    row.name.clone(),
                    row.payload_size.to_string(),
                    row.crc_extra.to_string(),
                    row.fields.to_string(),
                    row.extensions.to_string(),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(exit::SUCCESS)
}
