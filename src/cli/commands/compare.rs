use crate::cli::commands::{resolve_format, spinner, Session};
use crate::cli::visualize::ascii_histogram;
use crate::cli::OutputFormat;
use crate::compare::{ComparisonResult, SimilarityGrade};
use crate::core::ComparisonService;
use crate::config::Config;
use crate::SeqscopeError;
use clap::Args;
use colored::*;
use comfy_table::Cell;
use std::path::PathBuf;

#[derive(Args)]
pub struct CompareArgs {
    /// Reference FASTA file
    #[arg(short, long, value_name = "FILE")]
    pub reference: PathBuf,

    /// FASTA files to compare against the reference
    #[arg(short, long, value_name = "FILE", num_args = 1.., required = true)]
    pub compare: Vec<PathBuf>,

    /// Output format (text, json)
    #[arg(long)]
    pub format: Option<String>,

    /// Matches listed per reference sequence in text output
    #[arg(long, default_value = "5")]
    pub top: usize,
}

pub fn run(args: CompareArgs, config: &Config) -> anyhow::Result<()> {
    let format = resolve_format(args.format.as_deref(), config)?;

    let session = Session::new(config);
    let reference_id = session.register_input(&args.reference)?;
    let comparison_ids = args
        .compare
        .iter()
        .map(|path| session.register_input(path))
        .collect::<crate::Result<Vec<String>>>()?;

    let service = ComparisonService::new(session.analysis().clone(), config);
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    let pb = spinner(format!(
        "Comparing {} against {} file(s)...",
        args.reference.display(),
        comparison_ids.len()
    ));
    let outcome = runtime.block_on(service.compare(&reference_id, &comparison_ids));
    pb.finish_and_clear();
    let result = outcome.map_err(SeqscopeError::unshare)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*result)?),
        OutputFormat::Text => print_text_report(&result, &args),
    }

    Ok(())
}

fn grade_color(grade: SimilarityGrade) -> comfy_table::Color {
    use comfy_table::Color;
    match grade {
        SimilarityGrade::VerySimilar => Color::Green,
        SimilarityGrade::Similar => Color::Cyan,
        SimilarityGrade::Moderate => Color::Yellow,
        SimilarityGrade::SomewhatDifferent => Color::Magenta,
        SimilarityGrade::VeryDifferent => Color::Red,
    }
}

fn print_text_report(result: &ComparisonResult, args: &CompareArgs) {
    use crate::cli::output::*;

    let reference = &result.reference_file;
    section_header_with_line(&format!("Comparison Report: {}", reference.file_name));

    subsection_header("Reference");
    tree_item(false, "File", Some(&args.reference.display().to_string()));
    tree_item(false, "Sequences", Some(&format_number(reference.total_sequences as u64)));
    tree_item(
        true,
        "Average GC Content",
        Some(&format!("{:.2}%", reference.statistics.average_gc_content)),
    );

    let summary = &result.summary;
    subsection_header("Summary");
    if summary.total_comparisons == 0 {
        empty("No sequence pairs to compare");
        return;
    }
    tree_item(false, "Compared Files", Some(&args.compare.len().to_string()));
    tree_item(false, "Sequence Pairs", Some(&format_number(summary.total_comparisons as u64)));
    let similarity_items = [
        ("Average", format!("{:.2}%", summary.average_similarity)),
        ("Min", format!("{:.2}%", summary.min_similarity)),
        ("Max", format!("{:.2}%", summary.max_similarity)),
    ];
    tree_section("Similarity", &similarity_items, true);

    println!("\n{}", "Similarity Distribution".bold());
    let dist = &summary.similarity_distribution;
    let bands = vec![
        (SimilarityGrade::VerySimilar.label().to_string(), dist.very_high),
        (SimilarityGrade::Similar.label().to_string(), dist.high),
        (SimilarityGrade::Moderate.label().to_string(), dist.medium),
        (SimilarityGrade::SomewhatDifferent.label().to_string(), dist.low),
        (SimilarityGrade::VeryDifferent.label().to_string(), dist.very_low),
    ];
    print!("{}", ascii_histogram(&bands, 40, true));

    for entry in &result.sequence_comparisons {
        subsection_header(&format!(
            "{} ({} bp, {} matches)",
            entry.reference.sequence_id, entry.reference.length, entry.total_matches
        ));

        let mut table = create_standard_table();
        table.set_header(vec![
            header_cell("Sequence"),
            header_cell("File"),
            header_cell("Length Δ"),
            header_cell("Ratio"),
            header_cell("Similarity"),
            header_cell("Grade"),
        ]);
        for m in entry.matches.iter().take(args.top) {
            table.add_row(vec![
                Cell::new(&m.compared.sequence_id),
                Cell::new(&m.file_name),
                Cell::new(format!("{:+}", m.length_difference)),
                Cell::new(format!("{:.3}", m.length_ratio)),
                Cell::new(format!("{:.2}%", m.similarity_score)),
                Cell::new(m.similarity_grade.label()).fg(grade_color(m.similarity_grade)),
            ]);
        }
        println!("{}", table);

        if entry.total_matches > args.top {
            println!("{}", format!("  … {} more", entry.total_matches - args.top).dimmed());
        }
    }
}
