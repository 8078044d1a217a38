#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const LEAGUE_HEADER: &str =
    "Div,Date,Time,HomeTeam,AwayTeam,FTHG,FTAG,HS,AS,HST,AST,HF,AF,HC,AC,HY,AY,HR,AR,Referee";

/// Two fixtures per league, in the order the loader processes the files.
pub const LEAGUE_FILES: &[(&str, &str)] = &[
    (
        "D1.csv",
        "D1,05/08/2022,19:30,Bayern Munich,Dortmund,2,1,18,9,7,3,10,12,6,2,1,2,0,0,F Zwayer\n\
         D1,06/08/2022,14:30,Leipzig,Freiburg,0,0,11,8,3,2,13,9,4,4,2,1,0,0,D Siebert\n",
    ),
    (
        "E0.csv",
        "E0,05/08/2022,20:00,Chelsea,Arsenal,0,2,10,10,2,2,16,11,3,5,1,2,0,0,A Taylor\n\
         E0,06/08/2022,12:30,Liverpool,Everton,1,1,14,7,5,2,8,12,7,1,0,3,0,1,M Oliver\n",
    ),
    (
        "F1.csv",
        "F1,05/08/2022,21:00,Lyon,Paris SG,1,3,12,15,4,8,11,10,5,6,2,1,0,0,C Turpin\n\
         F1,06/08/2022,17:00,Marseille,Nice,2,2,16,11,6,4,14,13,8,3,3,2,0,0,F Letexier\n",
    ),
    (
        "I1.csv",
        "I1,13/08/2022,18:30,Inter,Milan,1,0,13,12,4,3,12,15,5,4,2,3,0,0,D Orsato\n\
         I1,14/08/2022,20:45,Napoli,Roma,2,1,17,6,6,2,9,14,9,2,1,2,0,0,M Guida\n",
    ),
    (
        "SP1.csv",
        "SP1,12/08/2022,21:00,Barcelona,Real Madrid,1,2,15,13,5,6,10,11,6,5,2,2,0,0,J Martinez\n\
         SP1,13/08/2022,19:00,Sevilla,Valencia,0,1,9,10,2,4,15,12,3,4,4,1,1,0,R de Burgos\n",
    ),
];

pub const TOURNAMENT_MATCHES: &str = "date,time,home_team,away_team,home_score,away_score,home_xg,away_xg,home_possession,away_possession,home_passes_completed,home_passes,away_passes_completed,away_passes,venue\n\
2022-11-24,16:00,Brazil,Croatia,1,1,1.8,0.9,55,45,510,590,420,500,Lusail Stadium\n\
2022-12-18,18:00,Argentina,France,3,3,2.9,2.1,54,46,480,560,400,480,Lusail Stadium\n";

pub const TOURNAMENT_STANDINGS: &str = "group,rank,team,matches_played,wins,draws,losses,goals_scored,goals_against,points\n\
Group A,1,Argentina,3,2,0,1,5,2,6\n\
Group A,2,France,3,2,0,1,6,3,6\n\
Group B,1,Brazil,3,2,0,1,3,1,6\n\
Group B,2,Croatia,3,1,2,0,4,1,5\n";

pub const PLAYER_STATS: &str = "player,position,team,age,games,minutes_90s,goals,assists\n\
Lionel Messi,FW,Argentina,35-148,7,7.6,7,3\n\
Kylian Mbappe,FW,France,23-357,7,6.4,8,2\n\
Neymar,FW,Brazil,30-285,3,2.7,2,1\n\
Luka Modric,MF,Croatia,37-089,7,6.8,0,1\n";

pub const PLAYER_SHOOTING: &str = "player,team,shots_total,shots_on_target,xg\n\
Lionel Messi,Argentina,32,14,6.7\n\
Kylian Mbappe,France,28,14,5.5\n\
Neymar,Brazil,12,5,2.3\n\
Luka Modric,Croatia,9,2,0.5\n";

pub const PLAYER_PASSING: &str = "player,team,passes_completed,passes,passes_pct\n\
Lionel Messi,Argentina,310,370,83.8\n\
Kylian Mbappe,France,190,240,79.2\n\
Neymar,Brazil,150,180,83.3\n\
Luka Modric,Croatia,480,540,88.9\n";

/// Thresholds sized for the fixture above.
pub const FIXTURE_CONFIG: &str = "teams: { min: 24, max: 24 }\n\
players: { min: 4, max: 4 }\n\
matches_base: { min: 12, max: 12 }\n\
matches_advanced: { min: 2, max: 2 }\n\
player_stats: { min: 4, max: 4 }\n\
standings: { min: 4, max: 4 }\n";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace, creating parent
    /// directories, and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.path().join("raw")
    }

    pub fn out_dir(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Lays out the five league files, the tournament files and the player
    /// files under `raw/`.
    pub fn write_raw_sources(&self) {
        for (file, rows) in LEAGUE_FILES {
            self.write(
                &format!("raw/leagues/{file}"),
                &format!("{LEAGUE_HEADER}\n{rows}"),
            );
        }
        self.write("raw/world_cup/data.csv", TOURNAMENT_MATCHES);
        self.write("raw/world_cup/group_stats.csv", TOURNAMENT_STANDINGS);
        self.write("raw/world_cup/player_data/player_stats.csv", PLAYER_STATS);
        self.write(
            "raw/world_cup/player_data/player_shooting.csv",
            PLAYER_SHOOTING,
        );
        self.write(
            "raw/world_cup/player_data/player_passing.csv",
            PLAYER_PASSING,
        );
    }

    pub fn write_config(&self) -> PathBuf {
        self.write("limits.yml", FIXTURE_CONFIG)
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("read output file")
    }
}
