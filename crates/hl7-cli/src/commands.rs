use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use tracing::{debug, info, info_span, warn};

use hl7_map::{MappingFormat, MappingLoader};
use hl7_model::{FieldAddress, Message};
use hl7_transform::{OPERATIONS, SystemValueSource, TransformExecutor, ValueSource};

use crate::cli::{InspectArgs, TransformArgs};
use crate::logging::redact_value;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn run_operations() -> Result<()> {
    println!("{}", operations_table());
    Ok(())
}

pub fn operations_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Operation", "Description", "Sources", "Arguments"]);
    apply_table_style(&mut table);
    for info in OPERATIONS {
        table.add_row(vec![info.name, info.description, info.sources, info.args]);
    }
    table
}

pub fn run_transform(args: &TransformArgs) -> Result<()> {
    let values: Arc<dyn ValueSource> = Arc::new(SystemValueSource::new());
    let message = transform(args, values)?;
    let er7 = message.to_er7();
    match &args.out {
        Some(path) => {
            fs::write(path, &er7)
                .with_context(|| format!("write message to {}", path.display()))?;
            info!(path = %path.display(), "message written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{er7}").context("write message to stdout")?;
        }
    }
    Ok(())
}

/// Load the mapping and message named by `args` and apply the mapping.
pub fn transform(args: &TransformArgs, values: Arc<dyn ValueSource>) -> Result<Message> {
    let span = info_span!("transform_command", mapping = %args.mapping.display());
    let _guard = span.enter();
    let start = Instant::now();

    let format = resolve_format(args);
    let mapping = MappingLoader::new(values)
        .load_file(&args.mapping, format)
        .with_context(|| format!("load mapping {}", args.mapping.display()))?;

    let mut message = match &args.message {
        Some(path) => read_message(path)?,
        None => {
            debug!("no input message, starting from an empty one");
            Message::new()
        }
    };

    TransformExecutor::new(mapping)
        .execute(&mut message)
        .context("apply mapping")?;

    info!(
        segments = message.segment_count(),
        duration_ms = start.elapsed().as_millis(),
        "transform command complete"
    );
    Ok(message)
}

fn resolve_format(args: &TransformArgs) -> MappingFormat {
    if let Some(explicit) = args.mapping_type {
        return explicit.into();
    }
    MappingFormat::from_path(&args.mapping).unwrap_or_else(|| {
        debug!(path = %args.mapping.display(), "mapping type not given, assuming json");
        MappingFormat::Json
    })
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let message = read_message(&args.message)?;
    let table = if args.fields.is_empty() {
        segments_table(&message)
    } else {
        fields_table(&message, &args.fields)?
    };
    println!("{table}");
    Ok(())
}

/// One row per segment with its populated field count.
pub fn segments_table(message: &Message) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Segment", "Fields"]);
    apply_table_style(&mut table);
    for (position, segment) in message.segments().iter().enumerate() {
        table.add_row(vec![
            (position + 1).to_string(),
            segment.code().to_string(),
            segment.fields().len().to_string(),
        ]);
    }
    table
}

/// One row per requested path. Unresolvable fields show the lookup error.
///
/// # Errors
///
/// Fails on the first malformed path.
pub fn fields_table(message: &Message, paths: &[String]) -> Result<Table> {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    apply_table_style(&mut table);
    for path in paths {
        let address = FieldAddress::parse(path).with_context(|| format!("parse field {path}"))?;
        let value = match message.get(&address) {
            Ok(value) => {
                debug!(field = %address, value = redact_value(&value), "field resolved");
                value
            }
            Err(error) => {
                warn!(field = %address, %error, "field lookup failed");
                format!("<{error}>")
            }
        };
        table.add_row(vec![address.to_string(), value]);
    }
    Ok(table)
}

fn read_message(path: &Path) -> Result<Message> {
    Message::from_file(path).with_context(|| format!("read message {}", path.display()))
}
