use crate::bio::stats::FileAggregate;
use crate::cli::commands::{resolve_format, spinner, Session};
use crate::cli::visualize::{ascii_histogram, progress_bar};
use crate::cli::OutputFormat;
use crate::config::Config;
use clap::Args;
use colored::*;
use std::path::PathBuf;

#[derive(Args)]
pub struct StatsArgs {
    /// Input FASTA file (optionally gzipped)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(long)]
    pub format: Option<String>,

    /// Show visual charts and graphs
    #[arg(long)]
    pub visual: bool,
}

pub fn run(args: StatsArgs, config: &Config) -> anyhow::Result<()> {
    let format = resolve_format(args.format.as_deref(), config)?;

    let session = Session::new(config);
    let file_id = session.register_input(&args.input)?;

    let pb = spinner(format!("Analyzing {}...", args.input.display()));
    let stats = session.analysis().statistics(&file_id);
    pb.finish_and_clear();
    let stats = stats?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*stats)?),
        OutputFormat::Text => {
            print_text_stats(&args.input, &stats);
            if args.visual {
                print_visual_stats(&stats);
            }
        }
    }

    Ok(())
}

fn print_text_stats(input: &std::path::Path, stats: &FileAggregate) {
    use crate::cli::output::*;

    section_header_with_line(&format!("FASTA Statistics: {}", input.display()));

    if stats.total_sequences == 0 {
        empty("No sequences found");
        return;
    }

    subsection_header("Sequence Metrics");
    tree_item(false, "Total Sequences", Some(&format_number(stats.total_sequences as u64)));
    tree_item(false, "Valid Sequences", Some(&format_number(stats.valid_sequences as u64)));
    tree_item(false, "Total Bases", Some(&format_number(stats.total_length)));

    let length_items = [
        ("Average", format!("{:.2} bp", stats.average_length)),
        (
            "Min/Max",
            format!(
                "{} / {} bp",
                format_number(stats.min_length as u64),
                format_number(stats.max_length as u64)
            ),
        ),
    ];
    tree_section("Length Statistics", &length_items, true);

    if stats.valid_sequences < stats.total_sequences {
        warning(&format!(
            "{} sequences contain symbols outside A, T, C, G, N and are excluded from the figures",
            stats.total_sequences - stats.valid_sequences
        ));
    }

    subsection_header("Composition Analysis");
    let counts = &stats.base_composition;
    let total = counts.total();
    let comp_items = [
        ("A", format!("{} ({:.1}%)", format_number(counts.a), percent(counts.a, total))),
        ("T", format!("{} ({:.1}%)", format_number(counts.t), percent(counts.t, total))),
        ("C", format!("{} ({:.1}%)", format_number(counts.c), percent(counts.c, total))),
        ("G", format!("{} ({:.1}%)", format_number(counts.g), percent(counts.g, total))),
        ("N", format!("{} ({:.1}%)", format_number(counts.n), percent(counts.n, total))),
    ];
    tree_item(false, "Average GC Content", Some(&format!("{:.2}%", stats.average_gc_content)));
    tree_section("Base Counts", &comp_items, true);

    if !stats.length_distribution.is_empty() {
        subsection_header("Length Distribution");
        let mut table = create_standard_table();
        table.set_header(vec![header_cell("Range (bp)"), header_cell("Sequences")]);
        for bin in &stats.length_distribution {
            table.add_row(vec![bin.to_string(), format_number(bin.count as u64)]);
        }
        println!("{}", table);
    }
}

fn print_visual_stats(stats: &FileAggregate) {
    if stats.valid_sequences == 0 {
        return;
    }

    println!("\n{}", "Length Distribution".bold());
    let lengths: Vec<(String, usize)> = stats
        .length_distribution
        .iter()
        .map(|bin| (bin.to_string(), bin.count))
        .collect();
    print!("{}", ascii_histogram(&lengths, 40, true));

    println!("\n{}", "GC Content Distribution".bold());
    let gc: Vec<(String, usize)> = stats
        .gc_distribution
        .iter()
        .map(|bin| (bin.to_string(), bin.count))
        .collect();
    print!("{}", ascii_histogram(&gc, 40, true));

    println!("\n{}", "Base Composition".bold());
    let counts = &stats.base_composition;
    let total = counts.total() as f64;
    for (label, count) in [("A", counts.a), ("T", counts.t), ("C", counts.c), ("G", counts.g), ("N", counts.n)] {
        println!("{}", progress_bar(count as f64, total, 40, label, true));
    }
    println!("{}", progress_bar(stats.average_gc_content, 100.0, 40, "GC (average)", true));
}
