/// LiveView CLI
///
/// Loads a JSON array of records into a DataView and prints the rows
/// projection, one JSON line per row.
///
/// Usage: liveview <records.json> [options.json]
///
/// Environment:
///   LIVEVIEW_GROUP_BY   field to group by (adds avg/min/max totals per numeric field)
///   LIVEVIEW_PAGE_SIZE  rows per page
///   RUST_LOG            log filter, defaults to "info"

use liveview::{
    records_from_json, Aggregator, AvgAggregator, DataView, Grouping, MaxAggregator,
    MinAggregator, PagingOptions, Row, ViewOptions,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::process;

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Err(err) = run() {
        log::error!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let records_path = args
        .next()
        .ok_or("usage: liveview <records.json> [options.json]")?;

    let options = match args.next() {
        Some(path) => ViewOptions::from_json(&fs::read_to_string(path)?)?,
        None => ViewOptions::default(),
    };

    let records = records_from_json(&fs::read_to_string(&records_path)?)?;
    log::info!("loaded {} records from {}", records.len(), records_path);

    // Numeric fields present anywhere, other than the id
    let numeric_fields: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.iter())
        .filter(|(field, value)| **field != options.id_field && value.as_number().is_some())
        .map(|(field, _)| field.clone())
        .collect();

    let mut view = DataView::with_options(options);
    view.on_paging_info_changed().subscribe(|info, _| {
        log::info!(
            "paging: page {} of size {}, {} total rows",
            info.page_num,
            info.page_size,
            info.total_rows
        );
    });

    view.begin_update();
    view.set_items(records, None)?;

    if let Ok(field) = std::env::var("LIVEVIEW_GROUP_BY") {
        log::info!("grouping by {}", field);
        let aggregators: Vec<Box<dyn Aggregator>> = numeric_fields
            .iter()
            .filter(|f| **f != field)
            .flat_map(|f| {
                [
                    Box::new(AvgAggregator::new(f.as_str())) as Box<dyn Aggregator>,
                    Box::new(MinAggregator::new(f.as_str())) as Box<dyn Aggregator>,
                    Box::new(MaxAggregator::new(f.as_str())) as Box<dyn Aggregator>,
                ]
            })
            .collect();
        view.group_by(Some(
            Grouping::by_field(field)
                .with_title(|g| format!("{} ({} items)", g.value(), g.count())),
        ));
        view.set_aggregators(aggregators, None);
    }

    if let Ok(page_size) = std::env::var("LIVEVIEW_PAGE_SIZE") {
        let page_size: usize = page_size
            .parse()
            .map_err(|_| format!("LIVEVIEW_PAGE_SIZE must be a number, got {:?}", page_size))?;
        view.set_paging_options(PagingOptions::page_size(page_size));
    }
    view.end_update();

    for row in view.rows() {
        println!("{}", render(row));
    }

    Ok(())
}

fn render(row: &Row) -> serde_json::Value {
    match row {
        Row::Item(record) => json!({ "item": record.as_ref() }),
        Row::Group(group) => json!({
            "group": group.value(),
            "title": group.title(),
            "count": group.count(),
            "collapsed": group.is_collapsed(),
        }),
        Row::Totals(totals) => {
            let results: serde_json::Map<String, serde_json::Value> = totals
                .iter()
                .map(|(kind, field, result)| (format!("{}.{}", kind, field), json!(result)))
                .collect();
            json!({ "totals": totals.group_value(), "results": results })
        }
    }
}
