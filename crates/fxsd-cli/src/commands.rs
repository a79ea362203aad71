use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tracing::{debug, info_span};

use fxsd::{RecordHeader, Serializer, TypeDescriptor, TypeEntry};
use fxsd_cli::demo::{DemoValues, read_demo, write_demo};
use fxsd_cli::dump::{dump_catalog, dump_data};
use fxsd_hash::hash_str;

use crate::cli::{DemoArgs, HashArgs, InspectArgs};

pub fn run_demo(args: &DemoArgs) -> Result<()> {
    let span = info_span!("demo", path = %args.out.display());
    let _guard = span.enter();

    let written = DemoValues::default();
    write_demo(&args.out, &written)
        .with_context(|| format!("write {}", args.out.display()))?;
    println!("Wrote {}", args.out.display());

    let read = read_demo(&args.out).with_context(|| format!("read {}", args.out.display()))?;
    println!("StructA: {}", read.a);
    println!("StructC: {{Value: {}}}", read.c.value);
    anyhow::ensure!(read == written, "values read back differ from values written");
    Ok(())
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let span = info_span!("inspect", path = %args.file.display());
    let _guard = span.enter();

    let mut serializer =
        Serializer::open(&args.file).with_context(|| format!("open {}", args.file.display()))?;
    let descriptors = serializer
        .catalog_mut()
        .descriptors()
        .context("resolve type catalog")?;
    let first = if serializer.stream().is_empty() {
        None
    } else {
        Some(
            serializer
                .stream_mut()
                .peek_record_header()
                .context("read first record header")?,
        )
    };
    debug!(types = descriptors.len(), "catalog resolved");

    if args.json {
        let report = serde_json::json!({
            "catalog_len": serializer.catalog().len(),
            "data_len": serializer.stream().len(),
            "entries": serializer.catalog().entries(),
            "types": descriptors,
            "first_record": first,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File: {}", args.file.display());
        println!(
            "Catalog: {} bytes, Data: {} bytes",
            serializer.catalog().len(),
            serializer.stream().len()
        );
        println!("{}", catalog_table(serializer.catalog().entries(), &descriptors));
        match first {
            Some(header) => println!("{}", describe_header(&header)),
            None => println!("No records."),
        }
    }

    if args.raw {
        println!("\nType catalog:");
        for row in dump_catalog(serializer.catalog().as_bytes()) {
            println!("{row}");
        }
        println!("\nData stream:");
        for row in dump_data(serializer.stream().as_bytes()) {
            println!("{row}");
        }
    }
    Ok(())
}

pub fn run_hash(args: &HashArgs) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Name"), header_cell("Hash")]);
    apply_table_style(&mut table);
    for name in &args.names {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("0x{:08X}", hash_str(name))),
        ]);
    }
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    println!("{table}");
}

fn catalog_table(entries: &[TypeEntry], descriptors: &[TypeDescriptor]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Offset"),
        header_cell("Size"),
        header_cell("Members (id:size)"),
    ]);
    apply_table_style(&mut table);
    for (entry, descriptor) in entries.iter().zip(descriptors) {
        let members = if descriptor.is_leaf() {
            Cell::new("-").fg(Color::DarkGrey)
        } else {
            Cell::new(
                descriptor
                    .members
                    .iter()
                    .map(|m| format!("{}:{}", m.id, m.size))
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(entry.offset),
            Cell::new(descriptor.size),
            members,
        ]);
    }
    table
}

fn describe_header(header: &RecordHeader) -> String {
    if header.name_hash == 0 {
        format!("First record: type {}, unnamed", header.type_id)
    } else {
        format!(
            "First record: type {}, name hash 0x{:08X}",
            header.type_id, header.name_hash
        )
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
