use std::fs;

use ligscreen_ranker::rank_files;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn test_rank_files_writes_sorted_and_best_lists() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("boltz").join("list_with_affinities_boltz.csv");
    fs::create_dir_all(input.parent().unwrap()).unwrap();

    let mut csv = String::from(
        "smiles,id-num,score,vina_affinity,boltz_affinity_kcalmol,avg_affinity_pred_value,avg_affinity_probability_binary\n",
    );
    for i in 0..12 {
        // ligand i: vina -(5 + i/2), boltz 6 + i/4
        let vina = -(5.0 + i as f64 / 2.0);
        let boltz = 6.0 + i as f64 / 4.0;
        csv.push_str(&format!("C{i},{i},0.5,{vina},{boltz},0.1,0.5\n"));
    }
    csv.push_str("N,12,0.5,-12.0,,,\n");
    fs::write(&input, csv).unwrap();

    let sorted = dir.path().join("list-sorted.csv");
    let best = dir.path().join("list-best10.csv");
    let ranking = rank_files(&input, &sorted, &best, 10).unwrap();

    let sorted_text = fs::read_to_string(&sorted).unwrap();
    let mut lines = sorted_text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "smiles,id-num,vina_affinity,boltz_affinity_kcalmol,avg_affinity_pred_value,avg_affinity_probability_binary,combined_score"
    );
    assert_eq!(lines.next().unwrap(), "C11,11,-10.5,8.75,0.1,0.5,-9.625");
    assert_eq!(sorted_text.lines().last().unwrap(), "N,12,-12.0,,,,");

    let best_text = fs::read_to_string(&best).unwrap();
    assert_eq!(best_text.lines().count(), 11);
    assert!(best_text.lines().next().unwrap().ends_with("avg_affinity_probability_binary"));

    let summary = ranking.summary;
    assert_eq!(summary.total, 13);
    assert_eq!(summary.with_vina, 13);
    assert_eq!(summary.with_both, 12);
    let top = summary.top_stats.unwrap();
    assert_eq!(top.best_combined, -9.625);
    // 10th best is ligand 2: (-6 - 6.5) / 2
    assert_eq!(top.nth_best_combined, Some(-6.25));
}
