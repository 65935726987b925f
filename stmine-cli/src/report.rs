//! Terminal tables and JSON export for mining reports.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use stmine::{AssociationRule, ContextIndex, MinedPatterns, MiningReport};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(header);
    table
}

/// One row per context: its itemsets, their supports, and the context id.
pub fn layer_table(layer: &MinedPatterns, index: &ContextIndex) -> Table {
    let mut table = new_table(vec!["ID", "Itemsets", "Count", "Location", "Time", "Hash"]);

    for (row, (context, patterns)) in layer.iter().enumerate() {
        let itemsets: Vec<String> = patterns.iter().map(|p| p.items.to_string()).collect();
        let counts: Vec<String> = patterns.iter().map(|p| p.support.to_string()).collect();
        let hash = index
            .id_of(context)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(row + 1),
            Cell::new(itemsets.join(", ")),
            Cell::new(counts.join(", ")),
            Cell::new(&context.location),
            Cell::new(&context.time),
            Cell::new(hash),
        ]);
    }
    table
}

pub fn rules_table(rules: &[AssociationRule]) -> Table {
    let mut table = new_table(vec!["Location", "Time", "Rule", "Support", "Confidence"]);
    for rule in rules {
        let confidence = Cell::new(format!("{:.2}", rule.confidence));
        table.add_row(vec![
            Cell::new(&rule.context.location),
            Cell::new(&rule.context.time),
            Cell::new(format!("{} → {}", rule.antecedent, rule.consequent)),
            Cell::new(rule.support),
            if rule.confidence >= 1.0 {
                confidence.fg(Color::Green)
            } else {
                confidence
            },
        ]);
    }
    table
}

pub fn summary_line(report: &MiningReport) -> String {
    format!(
        "{}: min_support={} concrete={} one_star={} two_star={} rules={} elapsed={}µs",
        report.algorithm,
        report.min_support,
        report.patterns.zero_star.pattern_count(),
        report.patterns.one_star.pattern_count(),
        report.patterns.two_star.pattern_count(),
        report.rules.len(),
        report.elapsed_micros(),
    )
}

/// Print every layer, the rules, and the summary.
pub fn print_report(report: &MiningReport) {
    let layers = [
        ("Zero-star (location, time)", &report.patterns.zero_star),
        ("One-star (location, *) / (*, time)", &report.patterns.one_star),
        ("Two-star (*, *)", &report.patterns.two_star),
    ];

    for (title, layer) in layers {
        println!("\n━━━ {title} ━━━");
        if layer.is_empty() {
            println!("  (no frequent itemsets)");
        } else {
            println!("{}", layer_table(layer, &report.index));
        }
    }

    if !report.rules.is_empty() {
        println!("\n━━━ Association rules ━━━");
        println!("{}", rules_table(&report.rules));
    }

    println!("\n{}", summary_line(report));
}

/// Timing table for a multi-algorithm comparison run.
pub fn comparison_table(reports: &[MiningReport]) -> Table {
    let mut table = new_table(vec!["Algorithm", "Patterns", "Elapsed (µs)"]);

    let fastest = reports.iter().map(MiningReport::elapsed_micros).min();
    for report in reports {
        let elapsed = Cell::new(report.elapsed_micros());
        table.add_row(vec![
            Cell::new(report.algorithm),
            Cell::new(report.patterns.zero_star.pattern_count()),
            if Some(report.elapsed_micros()) == fastest {
                elapsed.fg(Color::Green)
            } else {
                elapsed
            },
        ]);
    }
    table
}

pub fn to_json(report: &MiningReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
