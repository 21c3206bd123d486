//! Stage tests against stand-in shell scripts for the external tools.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use ligscreen_common::{CsvTable, LigscreenError};
use ligscreen_molecules::boltz::{predict_all, BoltzRunConfig, TargetSpec};
use ligscreen_molecules::docking::{dock_all, BatchDockingConfig, DockingOutcome};
use ligscreen_molecules::ligand::{add_id_column, prepare_ligands, PreparationConfig};
use ligscreen_molecules::vina_scores::merge_vina_affinities;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

const FAKE_SCRUB: &str = r#"
if [ "$1" = "BAD" ]; then echo "cannot embed" >&2; exit 1; fi
echo "$1" > "$3"
"#;

const FAKE_MK_PREPARE: &str = r#"cp "$2" "$4""#;

const FAKE_VINA: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --out) out="$2"; shift 2 ;;
    --ligand) lig="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case "$lig" in
  */1-prepared.pdbqt) echo "Parse error" >&2; exit 1 ;;
esac
echo "MODEL 1" > "$out"
printf 'mode |   affinity | dist from best mode\n-----+------------+----------\n   1       -8.250          0          0\n   2       -7.900      1.2        2.1\n'
"#;

fn prep_config(dir: &Path, bin: &Path) -> PreparationConfig {
    PreparationConfig {
        dir: dir.to_path_buf(),
        list_file: "list.csv".into(),
        scrub_executable: script(bin, "scrub.py", FAKE_SCRUB).display().to_string(),
        mk_prepare_executable: script(bin, "mk_prepare_ligand.py", FAKE_MK_PREPARE)
            .display()
            .to_string(),
        max_consecutive_empty: 5,
    }
}

#[tokio::test]
async fn test_prepare_dock_and_collect() {
    let root = tempdir().unwrap();
    let bin = root.path().join("bin");
    let ligands = root.path().join("ligands");
    let receptor = root.path().join("receptor");
    let poses = root.path().join("poses");
    for d in [&bin, &ligands, &receptor] {
        fs::create_dir_all(d).unwrap();
    }

    fs::write(ligands.join("cheese-export.csv"), "smiles,score\nCCO,0.9\nCCN,0.8\nBAD,0.1\n").unwrap();
    add_id_column(&ligands, "cheese", "list.csv").unwrap().unwrap();

    let report = prepare_ligands(&prep_config(&ligands, &bin)).await.unwrap();
    assert_eq!(report.processed_ids, vec!["0", "1", "2"]);
    assert_eq!(report.successful_conversions, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].reason, format!("{} failed", bin.join("scrub.py").display()));
    assert_eq!(report.missing_pdbqt, vec!["2".to_string()]);
    assert!(ligands.join("0-prepared.pdbqt").exists());

    fs::write(receptor.join("r.pdbqt"), "RECEPTOR\n").unwrap();
    fs::write(
        receptor.join("box.txt"),
        "center_x = 1\ncenter_y = 2\ncenter_z = 3\nsize_x = 20\nsize_y = 20\nsize_z = 20\n",
    )
    .unwrap();

    let docking = dock_all(&BatchDockingConfig {
        vina_executable: script(&bin, "vina", FAKE_VINA),
        ligands_dir: ligands.clone(),
        receptor: receptor.join("r.pdbqt"),
        box_file: receptor.join("box.txt"),
        box_as_config: false,
        exhaustiveness: 8,
        num_modes: 9,
        poses_dir: poses.clone(),
    })
    .await
    .unwrap();
    assert_eq!(docking.ligand_count, 2);
    assert_eq!(docking.successful, vec!["0"]);
    assert_eq!(docking.failed, vec!["1"]);
    assert_eq!(docking.outcome(), DockingOutcome::Partial);
    // the failed run still leaves its score file behind
    assert_eq!(docking.score_files, 2);
    assert_eq!(docking.pose_files, 1);

    let output = poses.join("list_with_affinities.csv");
    let summary = merge_vina_affinities(&ligands.join("list.csv"), &poses, None, &output).unwrap();
    assert_eq!(summary.with_score, 1);
    assert_eq!(summary.missing_ids, vec!["1", "2"]);

    let table = CsvTable::read(&output).unwrap();
    assert_eq!(table.headers(), &["smiles", "id-num", "score", "vina_affinity"]);
    assert_eq!(table.value(0, 3), "-8.25");
}

#[tokio::test]
async fn test_prepare_stops_when_tool_missing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("list.csv"), "smiles,id-num\nCCO,0\nCCN,1\n").unwrap();
    let config = PreparationConfig {
        dir: dir.path().to_path_buf(),
        list_file: "list.csv".into(),
        scrub_executable: "ligscreen-test-no-such-scrub".into(),
        mk_prepare_executable: "ligscreen-test-no-such-mk".into(),
        max_consecutive_empty: 5,
    };
    let report = prepare_ligands(&config).await.unwrap();
    assert_eq!(report.processed_ids, vec!["0"]);
    assert_eq!(report.failures[0].reason, "ligscreen-test-no-such-scrub not found");
    assert_eq!(report.successful_conversions, 0);
}

#[tokio::test]
async fn test_prepare_stops_on_empty_rows() {
    let root = tempdir().unwrap();
    let bin = root.path().join("bin");
    let dir = root.path().join("ligands");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("list.csv"), "smiles,id-num\nCCO,0\n,1\nC\n,3\nCCN,\n,5\nCCC,6\n").unwrap();

    let report = prepare_ligands(&prep_config(&dir, &bin)).await.unwrap();
    assert!(report.stopped_on_empty_rows);
    assert_eq!(report.processed_ids, vec!["0"]);
    assert!(report.all_succeeded());
}

#[tokio::test]
async fn test_blank_source_rows_keep_their_ids() {
    let root = tempdir().unwrap();
    let bin = root.path().join("bin");
    let dir = root.path().join("ligands");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("cheese.csv"), "smiles,score\nCCO,1\n\nc1ccccc1,2\n").unwrap();

    let list = add_id_column(&dir, "cheese", "list.csv").unwrap().unwrap();
    assert_eq!(
        fs::read_to_string(&list).unwrap(),
        "smiles,id-num,score\nCCO,0,1\nc1ccccc1,2,2\n"
    );

    let report = prepare_ligands(&prep_config(&dir, &bin)).await.unwrap();
    assert_eq!(report.processed_ids, vec!["0", "2"]);
    assert!(dir.join("2-prepared.pdbqt").exists());
    assert!(!dir.join("1-prepared.pdbqt").exists());
}

#[tokio::test]
async fn test_prepare_stops_on_blank_lines() {
    let root = tempdir().unwrap();
    let bin = root.path().join("bin");
    let dir = root.path().join("ligands");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("list.csv"), "smiles,id-num\nCCO,0\n\n\n,2\n\n\nCCN,5\n").unwrap();

    let report = prepare_ligands(&prep_config(&dir, &bin)).await.unwrap();
    assert!(report.stopped_on_empty_rows);
    assert_eq!(report.processed_ids, vec!["0"]);
    assert_eq!(report.successful_conversions, 1);
}

#[tokio::test]
async fn test_docking_aborts_without_vina() {
    let root = tempdir().unwrap();
    let ligands = root.path().join("ligands");
    fs::create_dir_all(&ligands).unwrap();
    fs::write(ligands.join("0-prepared.pdbqt"), "").unwrap();
    fs::write(root.path().join("r.pdbqt"), "").unwrap();
    fs::write(root.path().join("box.txt"), "").unwrap();

    let err = dock_all(&BatchDockingConfig {
        vina_executable: PathBuf::from("ligscreen-test-no-such-vina"),
        ligands_dir: ligands,
        receptor: root.path().join("r.pdbqt"),
        box_file: root.path().join("box.txt"),
        box_as_config: true,
        exhaustiveness: 8,
        num_modes: 9,
        poses_dir: root.path().join("poses"),
    })
    .await
    .unwrap_err();
    assert!(matches!(err, LigscreenError::ToolNotFound { .. }));
}

#[tokio::test]
async fn test_boltz_predict_all() {
    let root = tempdir().unwrap();
    let bin = root.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let boltz = script(
        &bin,
        "boltz",
        r#"if grep -q "smiles: BAD" "$2"; then echo "bad ligand" >&2; exit 2; fi
echo "predicted $2""#,
    );
    let list = root.path().join("list.csv");
    fs::write(&list, "smiles,id-num\nCCO,0\nBAD,1\n").unwrap();

    let config = BoltzRunConfig {
        executable: boltz.display().to_string(),
        target: TargetSpec {
            protein_sequence: "MENFQK".into(),
            protein_chain: "A".into(),
            ligand_chain: "B".into(),
            pocket_residues: vec![83, 134],
        },
        config_dir: root.path().join("configs"),
        results_dir: root.path().join("results"),
        use_msa_server: false,
        recycling_steps: 1,
        sampling_steps: 50,
        diffusion_samples: 3,
        step_scale: 1.2,
    };
    let report = predict_all(&list, &config).await.unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded, vec!["0"]);
    assert_eq!(report.failed, vec!["1"]);

    let yaml = fs::read_to_string(root.path().join("configs").join("0.yaml")).unwrap();
    assert!(yaml.contains("smiles: CCO"));
    assert!(yaml.contains("binder: B"));
}
