mod common;

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::str::contains;

use common::{LEAGUE_FILES, LEAGUE_HEADER, TestWorkspace};

const OUTPUT_TABLES: &[&str] = &[
    "ref_teams.csv",
    "ref_players.csv",
    "db_matches_base.csv",
    "db_match_stats_advanced.csv",
    "db_players_stats.csv",
    "db_standings.csv",
];

fn etl() -> Command {
    Command::cargo_bin("football-etl").expect("binary exists")
}

fn run_pipeline(workspace: &TestWorkspace, out_dir: &Path, config: Option<&Path>) -> Command {
    let mut cmd = etl();
    cmd.arg("run")
        .arg("--raw-dir")
        .arg(workspace.raw_dir())
        .arg("--out-dir")
        .arg(out_dir);
    if let Some(config) = config {
        cmd.arg("--config").arg(config);
    }
    cmd
}

fn data_lines(content: &str) -> Vec<&str> {
    content.lines().skip(1).collect()
}

#[test]
fn run_produces_exact_cardinalities_and_validates() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let config = workspace.write_config();
    let out = workspace.out_dir("clean");

    run_pipeline(&workspace, &out, Some(&config))
        .assert()
        .success()
        .stdout(contains("status: VALIDATED"));

    let expected = [
        ("ref_teams.csv", 24),
        ("ref_players.csv", 4),
        ("db_matches_base.csv", 12),
        ("db_match_stats_advanced.csv", 2),
        ("db_players_stats.csv", 4),
        ("db_standings.csv", 4),
    ];
    for (file, rows) in expected {
        let content = workspace.read(&out.join(file));
        assert_eq!(data_lines(&content).len(), rows, "{file}");
    }
    let manifest = workspace.read(&out.join("manifest.json"));
    assert!(manifest.contains("\"status\": \"validated\""));
    let report = workspace.read(&out.join("validation_report.json"));
    assert!(report.contains("\"failed_checks\": 0"));
    assert!(out.join("intermediate").join("load_report.json").exists());
}

#[test]
fn ids_follow_documented_ordering() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let config = workspace.write_config();
    let out = workspace.out_dir("clean");
    run_pipeline(&workspace, &out, Some(&config))
        .assert()
        .success();

    let teams = workspace.read(&out.join("ref_teams.csv"));
    let teams = data_lines(&teams);
    assert_eq!(teams[0], "1,Arsenal,league,,Premier League");
    assert!(teams[19].starts_with("20,Valencia,league,"));
    assert_eq!(teams[20], "21,Argentina,international,Argentina,World Cup");
    assert_eq!(teams[23], "24,France,international,France,World Cup");

    let players = workspace.read(&out.join("ref_players.csv"));
    let names = data_lines(&players)
        .iter()
        .map(|line| line.split(',').nth(1).unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec!["Kylian Mbappe", "Lionel Messi", "Luka Modric", "Neymar"]
    );

    let matches = workspace.read(&out.join("db_matches_base.csv"));
    let matches = data_lines(&matches);
    assert!(matches[0].starts_with("1,Bundesliga,2022-23,2022-08-05,19:30:00,3,5,2,1,"));
    assert!(matches[2].starts_with("3,Premier League,2022-23,2022-08-05,20:00:00,4,1,0,2,"));
    assert!(matches[10].starts_with("11,World Cup,2022,2022-11-24,16:00:00,22,23,1,1,"));

    let advanced = workspace.read(&out.join("db_match_stats_advanced.csv"));
    let advanced_ids = data_lines(&advanced)
        .iter()
        .map(|line| line.split(',').next().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(advanced_ids, vec!["11", "12"]);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let config = workspace.write_config();
    let first = workspace.out_dir("first");
    let second = workspace.out_dir("second");
    run_pipeline(&workspace, &first, Some(&config))
        .assert()
        .success();
    run_pipeline(&workspace, &second, Some(&config))
        .assert()
        .success();

    for file in OUTPUT_TABLES.iter().chain(["manifest.json", "validation_report.json"].iter()) {
        let a = fs::read(first.join(file)).expect("first output");
        let b = fs::read(second.join(file)).expect("second output");
        assert_eq!(a, b, "{file} differs between runs");
    }
}

#[test]
fn default_thresholds_fail_the_small_dataset() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let out = workspace.out_dir("clean");

    run_pipeline(&workspace, &out, None)
        .assert()
        .failure()
        .code(1)
        .stdout(contains("status: FAILED"))
        .stdout(contains("row count 100-150"))
        .stdout(contains("24 rows"))
        .stderr(contains("validation failed"));

    let manifest = workspace.read(&out.join("manifest.json"));
    assert!(manifest.contains("\"status\": \"unvalidated\""));
    assert!(out.join("ref_teams.csv").exists());
}

#[test]
fn malformed_and_duplicate_rows_are_excluded_not_fatal() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let (file, rows) = LEAGUE_FILES[1];
    workspace.write(
        &format!("raw/leagues/{file}"),
        &format!(
            "{LEAGUE_HEADER}\n{rows}\
             E0,31/02/2022,15:00,Chelsea,Everton,1,0,5,5,1,1,1,1,1,1,0,0,0,0,P Tierney\n\
             E0,07/08/2022,15:00,Arsenal,Liverpool,two,0,5,5,1,1,1,1,1,1,0,0,0,0,P Tierney\n\
             E0,06/08/2022,12:30,Liverpool,Everton,1,1,14,7,5,2,8,12,7,1,0,3,0,1,M Oliver\n"
        ),
    );
    let config = workspace.write_config();
    let out = workspace.out_dir("clean");

    etl()
        .arg("load")
        .arg("--raw-dir")
        .arg(workspace.raw_dir())
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();
    let report = workspace.read(&out.join("intermediate").join("load_report.json"));
    assert!(report.contains("\"excluded_rows\": 2"));
    assert!(report.contains("\"duplicate_rows\": 1"));
    assert!(report.contains("E0.csv row 5: field 'FTHG'"));
    let clean = workspace.read(&out.join("intermediate").join("clean_matches.csv"));
    assert_eq!(data_lines(&clean).len(), 12);

    run_pipeline(&workspace, &out, Some(&config))
        .assert()
        .success();
}

#[test]
fn conflicting_team_identity_is_fatal() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    workspace.write(
        "raw/leagues/F1.csv",
        &format!(
            "{LEAGUE_HEADER}\n\
             F1,05/08/2022,21:00,Lyon,France,1,3,12,15,4,8,11,10,5,6,2,1,0,0,C Turpin\n"
        ),
    );
    let out = workspace.out_dir("clean");

    run_pipeline(&workspace, &out, None)
        .assert()
        .failure()
        .code(1)
        .stdout(contains("status: FAILED"))
        .stderr(contains("would be assigned more than one id"));
    assert!(!out.join("validation_report.json").exists());
}

#[test]
fn isolated_steps_match_a_full_run() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let config = workspace.write_config();
    let full = workspace.out_dir("full");
    let stepped = workspace.out_dir("stepped");
    run_pipeline(&workspace, &full, Some(&config))
        .assert()
        .success();

    for step in ["load", "register", "normalize", "split", "derive"] {
        etl()
            .arg(step)
            .arg("--raw-dir")
            .arg(workspace.raw_dir())
            .arg("--out-dir")
            .arg(&stepped)
            .assert()
            .success();
    }
    etl()
        .arg("validate")
        .arg("--out-dir")
        .arg(&stepped)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("status: VALIDATED"));

    for file in OUTPUT_TABLES.iter().chain(["manifest.json"].iter()) {
        let a = fs::read(full.join(file)).expect("full output");
        let b = fs::read(stepped.join(file)).expect("stepped output");
        assert_eq!(a, b, "{file} differs between full and stepped runs");
    }
}

#[test]
fn step_without_prior_artifacts_fails() {
    let workspace = TestWorkspace::new();
    etl()
        .arg("split")
        .arg("--out-dir")
        .arg(workspace.out_dir("empty"))
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn export_json_requires_validated_output() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let out = workspace.out_dir("clean");
    let json_dir = workspace.out_dir("json");
    run_pipeline(&workspace, &out, None).assert().failure();

    etl()
        .arg("export-json")
        .arg("--out-dir")
        .arg(&out)
        .arg("--json-dir")
        .arg(&json_dir)
        .assert()
        .failure()
        .stderr(contains("has not passed validation"));
    assert!(!json_dir.exists());
}

#[test]
fn export_json_writes_samples() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let config = workspace.write_config();
    let out = workspace.out_dir("clean");
    let json_dir = workspace.out_dir("json");
    run_pipeline(&workspace, &out, Some(&config))
        .assert()
        .success();

    etl()
        .arg("export-json")
        .arg("--out-dir")
        .arg(&out)
        .arg("--json-dir")
        .arg(&json_dir)
        .assert()
        .success();

    let players: serde_json::Value =
        serde_json::from_str(&workspace.read(&json_dir.join("sample_players.json")))
            .expect("players json");
    assert_eq!(players[0]["name"], "Kylian Mbappe");
    assert_eq!(players[0]["stats"]["goals"], 8);
    assert_eq!(players[3]["name"], "Luka Modric");

    let matches: serde_json::Value =
        serde_json::from_str(&workspace.read(&json_dir.join("sample_matches.json")))
            .expect("matches json");
    assert_eq!(matches.as_array().map(Vec::len), Some(12));
    assert_eq!(matches[0]["competition"], "Bundesliga");
    assert_eq!(matches[0]["homeTeam"]["teamId"], 3);

    let standings: serde_json::Value =
        serde_json::from_str(&workspace.read(&json_dir.join("sample_standings.json")))
            .expect("standings json");
    assert_eq!(standings["Group B"][1]["team"], "Croatia");
    assert_eq!(standings["Group B"][1]["metrics"]["cleanSheets"], 3);

    let teams = workspace.read(&json_dir.join("sample_teams.json"));
    assert!(teams.contains("\"type\": \"international\""));
}

#[test]
fn rerunning_a_step_revokes_validation() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let config = workspace.write_config();
    let out = workspace.out_dir("clean");
    let json_dir = workspace.out_dir("json");
    run_pipeline(&workspace, &out, Some(&config))
        .assert()
        .success();
    assert!(out.join("manifest.json").exists());

    let (file, rows) = LEAGUE_FILES[0];
    workspace.write(
        &format!("raw/leagues/{file}"),
        &format!("{LEAGUE_HEADER}\n{}", rows.replace("Bayern Munich", "Aaa FC")),
    );
    for step in ["load", "register"] {
        etl()
            .arg(step)
            .arg("--raw-dir")
            .arg(workspace.raw_dir())
            .arg("--out-dir")
            .arg(&out)
            .assert()
            .success();
    }
    assert!(!out.join("manifest.json").exists());
    let teams = workspace.read(&out.join("ref_teams.csv"));
    assert!(data_lines(&teams)[0].starts_with("1,Aaa FC,"));

    etl()
        .arg("export-json")
        .arg("--out-dir")
        .arg(&out)
        .arg("--json-dir")
        .arg(&json_dir)
        .assert()
        .failure()
        .stderr(contains("has not passed validation"));
    assert!(!json_dir.exists());
}

#[test]
fn export_json_rejects_tables_edited_after_validation() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let config = workspace.write_config();
    let out = workspace.out_dir("clean");
    let json_dir = workspace.out_dir("json");
    run_pipeline(&workspace, &out, Some(&config))
        .assert()
        .success();

    let teams = workspace.read(&out.join("ref_teams.csv"));
    fs::write(out.join("ref_teams.csv"), teams.replace("Arsenal", "Arsenal FC"))
        .expect("edit ref_teams");

    etl()
        .arg("export-json")
        .arg("--out-dir")
        .arg(&out)
        .arg("--json-dir")
        .arg(&json_dir)
        .assert()
        .failure()
        .stderr(contains("changed after it was validated"));
    assert!(!json_dir.exists());
}

#[test]
fn overflowing_goal_counts_fail_validation_without_panicking() {
    let workspace = TestWorkspace::new();
    workspace.write_raw_sources();
    let (file, rows) = LEAGUE_FILES[1];
    workspace.write(
        &format!("raw/leagues/{file}"),
        &format!(
            "{LEAGUE_HEADER}\n{rows}\
             E0,07/08/2022,15:00,Chelsea,Everton,2147483647,1,5,5,1,1,1,1,1,1,0,0,0,0,P Tierney\n"
        ),
    );
    let config = workspace.write_config();
    let out = workspace.out_dir("clean");

    run_pipeline(&workspace, &out, Some(&config))
        .assert()
        .failure()
        .code(1)
        .stdout(contains("status: FAILED"))
        .stdout(contains("derived columns are present"))
        .stderr(contains("validation failed"));
}
