/// Grouping Example
///
/// This example demonstrates:
/// - Loading records into a DataView
/// - Grouping by a field with per-group totals
/// - Collapsing a group
/// - Observing which rows change after an update

use liveview::{
    record, AvgAggregator, DataView, Grouping, MaxAggregator, MinAggregator, Row, SortOrder, Value,
};

fn print_rows(view: &DataView) {
    for (i, row) in view.rows().iter().enumerate() {
        match row {
            Row::Group(group) => println!("  {:>2}  [{}]", i, group.title()),
            Row::Item(item) => println!(
                "  {:>2}      {:<10} {:>8}",
                i,
                item.get("product").map(|v| v.to_string()).unwrap_or_default(),
                item.get("price").map(|v| v.to_string()).unwrap_or_default(),
            ),
            Row::Totals(totals) => println!(
                "  {:>2}      avg {:.2}  min {:.2}  max {:.2}",
                i,
                totals.get("avg", "price").unwrap_or(0.0),
                totals.get("min", "price").unwrap_or(0.0),
                totals.get("max", "price").unwrap_or(0.0),
            ),
        }
    }
}

fn main() {
    println!("=== LiveView Grouping Example ===\n");

    // 1. Load products
    println!("1. Loading products...");
    let products = vec![
        (1, "Laptop", "Electronics", 999.99),
        (2, "Mouse", "Electronics", 29.99),
        (3, "Desk", "Furniture", 299.99),
        (4, "Chair", "Furniture", 199.99),
        (5, "Monitor", "Electronics", 399.99),
        (6, "Lamp", "Lighting", 49.99),
    ];

    let mut view = DataView::new();
    view.set_items(
        products
            .into_iter()
            .map(|(id, product, category, price)| {
                record([
                    ("id", Value::Int(id)),
                    ("product", Value::from(product)),
                    ("category", Value::from(category)),
                    ("price", Value::Float(price)),
                ])
            })
            .collect(),
        None,
    )
    .unwrap();
    println!("   {} rows\n", view.get_length());

    view.on_rows_changed()
        .subscribe(|args, _| println!("   rows changed: {:?}", args.rows));

    // 2. Sort and group in one batch
    println!("2. Grouping by category, sorted by price...");
    view.begin_update();
    view.sort_by_field("price", SortOrder::Descending);
    view.group_by(Some(
        Grouping::by_field("category")
            .with_title(|g| format!("{} ({} items)", g.value(), g.count()))
            .with_comparator(|a, b| a.value().total_cmp(b.value())),
    ));
    view.set_aggregators(
        vec![
            Box::new(AvgAggregator::new("price")),
            Box::new(MinAggregator::new("price")),
            Box::new(MaxAggregator::new("price")),
        ],
        None,
    );
    view.end_update();
    print_rows(&view);
    println!();

    // 3. Collapse a group
    println!("3. Collapsing Furniture...");
    view.collapse_group("Furniture");
    print_rows(&view);
    println!();

    // 4. Update one record
    println!("4. Discounting the mouse...");
    view.update_item(
        2,
        record([
            ("id", Value::Int(2)),
            ("product", Value::from("Mouse")),
            ("category", Value::from("Electronics")),
            ("price", Value::Float(19.99)),
        ]),
    )
    .unwrap();
    print_rows(&view);

    println!("\n=== Example Complete ===");
}
