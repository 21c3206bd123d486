//! Human-readable stage reports printed to stdout.

use console::style;

use ligscreen_molecules::boltz::{BoltzSummary, PredictionReport};
use ligscreen_molecules::docking::{DockingOutcome, DockingReport};
use ligscreen_molecules::ligand::PreparationReport;
use ligscreen_molecules::profile::CandidateSummary;
use ligscreen_molecules::vina_scores::VinaSummary;
use ligscreen_ranker::scorer::COMBINED;
use ligscreen_ranker::Ranking;

const RULE: &str = "============================================================";

fn ok(msg: impl std::fmt::Display) {
    println!("{} {msg}", style("✓").green().bold());
}

fn warn(msg: impl std::fmt::Display) {
    println!("{} {msg}", style("⚠").yellow().bold());
}

fn fail(msg: impl std::fmt::Display) {
    println!("{} {msg}", style("✗").red().bold());
}

fn heading(title: &str) {
    println!("\n{RULE}\n{}\n{RULE}", style(title).bold());
}

fn fmt_opt(value: Option<f64>, dp: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.dp$}"))
}

pub fn preparation(report: &PreparationReport) {
    heading("LIGAND PREPARATION SUMMARY");
    println!("Ligands processed:        {}", report.processed_ids.len());
    println!("Successful conversions:   {}", report.successful_conversions);
    println!("Failed conversions:       {}", report.failures.len());
    if let Some(rate) = report.success_rate() {
        println!("Success rate:             {rate:.1}%");
    }
    if report.stopped_on_empty_rows {
        warn("Stopped early on consecutive empty rows");
    }
    for failure in &report.failures {
        println!("  - ligand {}: {}", failure.id, failure.reason);
    }
    if !report.missing_sdf.is_empty() {
        warn(format!("Missing SDF files for ids: {}", report.missing_sdf.join(", ")));
    }
    if !report.missing_pdbqt.is_empty() {
        warn(format!("Missing PDBQT files for ids: {}", report.missing_pdbqt.join(", ")));
    }
    if report.all_succeeded() {
        ok("All ligands prepared");
    }
}

pub fn docking(report: &DockingReport) {
    heading("DOCKING SUMMARY");
    println!("Total ligands:            {}", report.ligand_count);
    println!("Successful dockings:      {}", report.successful.len());
    println!("Failed dockings:          {}", report.failed.len());
    println!("Success rate:             {:.1}%", report.success_rate());
    println!("Score files in {}: {}", report.poses_dir.display(), report.score_files);
    println!("Pose files in {}:  {}", report.poses_dir.display(), report.pose_files);
    if !report.failed.is_empty() {
        println!("Failed ligands: {}", report.failed.join(", "));
    }
    match report.outcome() {
        DockingOutcome::AllSucceeded => ok("All dockings completed successfully"),
        DockingOutcome::Partial => warn("Some dockings failed, check the log above"),
        DockingOutcome::AllFailed => fail("All dockings failed"),
    }
}

pub fn vina(summary: &VinaSummary) {
    println!("Using '{}' as the matching column", summary.id_column);
    if !summary.missing_ids.is_empty() {
        let shown: Vec<&str> = summary.missing_ids.iter().take(10).map(String::as_str).collect();
        let more = if summary.missing_ids.len() > 10 { "..." } else { "" };
        warn(format!(
            "{} ligands don't have affinity scores. Missing IDs: [{}]{more}",
            summary.missing_ids.len(),
            shown.join(", ")
        ));
    }
    println!("Results saved to: {}", summary.output.display());

    if let Some(stats) = &summary.stats {
        heading("AFFINITY STATISTICS");
        println!("Total ligands: {}", summary.total);
        println!("Ligands with scores: {}", summary.with_score);
        println!("Best affinity: {:.3} kcal/mol", stats.best);
        println!("Worst affinity: {:.3} kcal/mol", stats.worst);
        println!("Mean affinity: {:.3} kcal/mol", stats.mean);
        println!("Median affinity: {:.3} kcal/mol", stats.median);
        println!("{RULE}");

        println!("\nTop 10 Best Binders:");
        println!("{:>8}  {:>13}", summary.id_column, "vina_affinity");
        for (id, affinity) in &summary.top {
            println!("{id:>8}  {affinity:>13.3}");
        }
    }
    ok("Processing complete!");
}

pub fn boltz_predictions(report: &PredictionReport) {
    heading("BOLTZ PREDICTIONS");
    println!("Ligands submitted:        {}", report.attempted);
    println!("Successful predictions:   {}", report.succeeded.len());
    println!("Failed predictions:       {}", report.failed.len());
    if report.failed.is_empty() {
        ok("All predictions finished");
    } else {
        warn(format!("Failed ligands: {}", report.failed.join(", ")));
    }
}

pub fn boltz(summary: &BoltzSummary) {
    println!(
        "\nSummary: Processed {} results, {} missing/errors",
        summary.processed, summary.missing
    );
    println!("Matching on column: {}", summary.id_column);
    println!("Matched {}/{} rows with Boltz results", summary.matched, summary.total);
    ok(format!("New CSV saved to: {}", summary.output.display()));
    println!("Added columns: boltz_affinity_kcalmol, avg_affinity_pred_value, avg_affinity_probability_binary");

    if let Some(stats) = &summary.stats {
        println!("\nBoltz Affinity Statistics:");
        println!("   Mean: {:.2} kcal/mol", stats.mean);
        println!("   Std:  {} kcal/mol", fmt_opt(stats.std, 2));
        println!("   Min:  {:.2} kcal/mol", stats.min);
        println!("   Max:  {:.2} kcal/mol", stats.max);
    }
}

pub fn ranking(ranking: &Ranking, sorted: &std::path::Path, best: &std::path::Path) {
    let s = &ranking.summary;
    println!("Total molecules: {}", s.total);
    println!("Molecules with Vina affinity: {}", s.with_vina);
    println!("Molecules with Boltz affinity: {}", s.with_boltz);
    println!("Molecules with both affinities: {}", s.with_both);

    ok(format!("Saved sorted list with {} molecules to '{}'", ranking.sorted.len(), sorted.display()));
    ok(format!("Saved top {} molecules to '{}'", ranking.best.len(), best.display()));

    if let (Some(v), Some(b)) = (s.vina_range, s.boltz_range) {
        println!("\n=== DATA RANGES ===");
        println!("Vina affinity range: {:.3} to {:.3}", v.0, v.1);
        println!("Boltz affinity range: {:.3} to {:.3}", b.0, b.1);
    }

    println!("\n=== SORTING ===");
    println!("{COMBINED} = (vina_affinity - boltz_affinity_kcalmol) / 2");
    println!("Most negative first; molecules missing either value are placed at the end.");

    println!("\n=== TOP {} MOLECULES ===", s.top_n);
    println!("{}", ranking.best.headers().join("  "));
    for row in ranking.best.rows() {
        println!("{}", row.join("  "));
    }

    if let Some(top) = &s.top_stats {
        println!("\n=== STATISTICS OF TOP {} ===", s.top_n);
        println!("Total molecules with both affinities: {}", s.with_both);
        println!("Best combined score: {:.3}", top.best_combined);
        if let Some(nth) = top.nth_best_combined {
            println!("Combined score at position {}: {nth:.3}", s.top_n);
        }
        println!("Average Vina in top {}: {:.3}", s.top_n, top.avg_vina);
        println!("Average Boltz in top {}: {:.3}", s.top_n, top.avg_boltz);
        println!("Average pred_value in top {}: {}", s.top_n, fmt_opt(top.avg_pred_value, 3));
        println!("Average probability in top {}: {}", s.top_n, fmt_opt(top.avg_probability, 3));
    }
}

pub fn candidates(summary: &CandidateSummary) {
    let n = summary.total;
    ok(format!("Saved {n} candidates to '{}'", summary.output.display()));
    if summary.parsed < n {
        warn(format!("{} structures could not be parsed", n - summary.parsed));
    }

    heading("ANALYSIS SUMMARY");
    println!("\nDrug-likeness:");
    println!("   Lipinski pass: {}/{n}", summary.lipinski_pass);
    println!("   Average QED: {}", fmt_opt(summary.avg_qed, 3));
    println!("   QED >= 0.7 (Excellent): {}/{n}", summary.qed_excellent);

    println!("\nKinase-Specific Metrics:");
    println!("   Avg aromatic rings: {}", fmt_opt(summary.avg_aromatic_rings, 1));
    println!("   Avg TPSA: {} A^2", fmt_opt(summary.avg_tpsa, 1));
    println!("   TPSA in ideal range (40-100): {}/{n}", summary.tpsa_in_range);
    println!("   Avg kinase score: {}/11", fmt_opt(summary.avg_kinase_score, 1));
    println!("   High kinase score (>=8): {}/{n}", summary.high_kinase_score);

    println!("\nADMET Profile:");
    println!("   Avg solubility (LogS): {}", fmt_opt(summary.avg_solubility_logs, 2));
    println!("   Soluble compounds: {}/{n}", summary.soluble);
    println!("   BBB permeability (Likely): {}/{n}", summary.bbb_likely);
    println!("   CYP3A4 low risk: {}/{n}", summary.cyp3a4_low_risk);
    println!("   hERG low risk: {}/{n}", summary.herg_low_risk);

    println!("\nTop 3 candidates by kinase score:");
    for top in &summary.top {
        println!("\n   ID: {}", top.label);
        println!("      Kinase score: {}, QED: {:.3}", top.kinase_score, top.qed);
        println!("      TPSA: {:.1}, Aromatic rings: {}", top.tpsa, top.num_aromatic_rings);
        println!("      Solubility: {}, hERG: {}", top.solubility, top.herg);
    }
    println!("\n{RULE}");
}
