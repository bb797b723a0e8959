use anyhow::Result;
use comfy_table::Table;

use devdata_cli::pipeline::{NormalizeFileInput, normalize_file};
use devdata_cli::types::NormalizeResult;
use devdata_model::{EventType, OrderingMode, ProcessingOptions};

use crate::cli::NormalizeArgs;
use crate::summary::apply_table_style;

pub fn run_types() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Type", "Processing"]);
    apply_table_style(&mut table);
    for event_type in EventType::ALL {
        table.add_row(vec![event_type.as_str(), describe(event_type)]);
    }
    table.add_row(vec!["(other)", "passed through unchanged; deviceTime derived"]);
    println!("{table}");
    Ok(())
}

fn describe(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Cbg => "continuous glucose; value converted mmol/L -> mg/dL when timed",
        EventType::Smbg => "fingerstick glucose; value converted mmol/L -> mg/dL when timed",
        EventType::Basal => "start/end resolved against the next basal segment",
        EventType::Bolus => "subType, duration and end derived; expected amounts kept",
        EventType::Wizard => "joined onto its bolus, or kept standalone if the bolus is absent",
    }
}

pub fn run_normalize(args: &NormalizeArgs) -> Result<NormalizeResult> {
    normalize_file(&NormalizeFileInput {
        input: &args.input,
        output: args.output.as_deref(),
        options: processing_options(args),
        pretty: args.pretty,
    })
}

fn processing_options(args: &NormalizeArgs) -> ProcessingOptions {
    if args.strict {
        return ProcessingOptions::strict();
    }
    let ordering = if args.sort {
        OrderingMode::SortByTime
    } else {
        OrderingMode::AssumeSorted
    };
    ProcessingOptions::new().with_ordering(ordering)
}
