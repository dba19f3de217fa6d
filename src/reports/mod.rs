use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use mapf_cem::grid::Coord;
use mapf_cem::instance::MapfInstance;
use mapf_cem::optimizer::{ResultNote, UNREACHABLE_COST};
use mapf_cem::results::ResultRecord;

pub struct InstanceSummary {
    pub record: ResultRecord,
    pub generations: usize,
    pub best_sampled: f64,
}

fn cost_cell(cost: f64) -> Cell {
    let text = if cost.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.0}", cost)
    };
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if cost.is_infinite() || cost == UNREACHABLE_COST {
        cell.fg(Color::Red)
    } else {
        cell.fg(Color::Cyan)
    }
}

pub fn print_assignment(instance: &MapfInstance, permutation: &[Coord]) {
    println!("\nAssignment: {}", instance.name);
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Agent").add_attribute(Attribute::Bold),
        Cell::new("Start"),
        Cell::new("Goal"),
    ]);

    for (i, (start, goal)) in instance.starts.iter().zip(permutation).enumerate() {
        table.add_row(vec![
            Cell::new(i).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:?}", start)),
            Cell::new(format!("{:?}", goal)),
        ]);
    }
    println!("{}", table);
}

/// Best cost per generation with a crude bar scaled to the worst finite entry.
pub fn print_trace(name: &str, trace: &[f64]) {
    println!("\nConvergence: {}", name);
    let worst = trace
        .iter()
        .copied()
        .filter(|c| c.is_finite())
        .fold(0.0f64, f64::max);

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Gen", "Best", ""]);

    for (g, &cost) in trace.iter().enumerate() {
        let bar = if cost.is_finite() && worst > 0.0 {
            "#".repeat(((cost / worst) * 40.0).round() as usize)
        } else {
            String::new()
        };
        table.add_row(vec![
            Cell::new(g).set_alignment(CellAlignment::Right),
            cost_cell(cost),
            Cell::new(bar),
        ]);
    }
    println!("{}", table);
}

pub fn print_summary(summaries: &[InstanceSummary]) {
    if summaries.is_empty() {
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Instance").add_attribute(Attribute::Bold),
        Cell::new("Final").fg(Color::Cyan),
        Cell::new("Best Sampled"),
        Cell::new("Gens"),
        Cell::new("Note"),
    ]);

    for s in summaries {
        let note = match s.record.note {
            ResultNote::Success => Cell::new("ok").fg(Color::Green),
            other => Cell::new(other.to_string()).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&s.record.instance).add_attribute(Attribute::Bold),
            cost_cell(s.record.final_cost),
            cost_cell(s.best_sampled),
            Cell::new(s.generations).set_alignment(CellAlignment::Right),
            note,
        ]);
    }
    println!("\n{}", table);
}
