//! Minimal slate CSV parser.
//!
//! Only understands a fixed set of columns: `name` and `salary` (required),
//! `position`/`positions`, a team column and an id column. Rows are split on
//! commas; quoted commas are not supported.

use super::{Player, DEFAULT_POSITION};

const POSITION_COLUMNS: [&str; 2] = ["position", "positions"];
const TEAM_COLUMNS: [&str; 4] = ["team", "teamabbrev", "team_abbrev", "tm"];
const ID_COLUMNS: [&str; 3] = ["id", "player_id", "playerid"];
const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

struct Columns {
    name: usize,
    salary: usize,
    positions: Option<usize>,
    team: Option<usize>,
    id: Option<usize>,
}

impl Columns {
    fn locate(header: &[String]) -> Option<Self> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let find_any = |names: &[&str]| names.iter().find_map(|n| find(n));

        Some(Self {
            name: find("name")?,
            salary: find("salary")?,
            positions: find_any(&POSITION_COLUMNS),
            team: find_any(&TEAM_COLUMNS),
            id: find_any(&ID_COLUMNS),
        })
    }
}

/// Parse slate CSV text into players.
///
/// Players below `min_salary` are dropped; the rest are sorted by salary
/// (highest first, ties by name) and capped at `max_players`. Returns an empty
/// list when the header lacks `name` or `salary`. Malformed rows are skipped.
pub fn parse_csv(text: &str, min_salary: f64, max_players: usize) -> Vec<Player> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let header: Vec<String> = split_row(header_line.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();

    let Some(columns) = Columns::locate(&header) else {
        return Vec::new();
    };

    let mut players: Vec<Player> = lines
        .filter_map(|line| parse_row(&split_row(line), &columns))
        .filter(|p| p.salary >= min_salary)
        .collect();

    players.sort_by(|a, b| {
        b.salary
            .total_cmp(&a.salary)
            .then_with(|| a.name.cmp(&b.name))
    });
    players.truncate(max_players);
    players
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',').map(clean_cell).collect()
}

fn clean_cell(cell: &str) -> String {
    let cell = cell.trim();
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell)
        .trim()
        .to_string()
}

fn parse_row(cells: &[String], columns: &Columns) -> Option<Player> {
    let name = cells.get(columns.name).filter(|n| !n.is_empty())?.clone();
    let salary = parse_salary(cells.get(columns.salary)?)?;

    let optional = |idx: Option<usize>| {
        idx.and_then(|i| cells.get(i))
            .filter(|c| !c.is_empty())
            .cloned()
    };

    let positions = parse_positions(optional(columns.positions).as_deref().unwrap_or(""));
    let player_id = optional(columns.id).unwrap_or_else(|| slug(&name));

    Some(Player {
        name,
        player_id,
        positions,
        salary,
        team: optional(columns.team),
    })
}

fn parse_positions(raw: &str) -> Vec<String> {
    let positions: Vec<String> = raw
        .replace('/', ",")
        .split(',')
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty())
        .collect();

    if positions.is_empty() {
        vec![DEFAULT_POSITION.to_string()]
    } else {
        positions
    }
}

/// Unparseable or non-finite salaries count as zero. Negative salaries
/// reject the row.
fn parse_salary(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(CURRENCY_SYMBOLS)
        .unwrap_or(trimmed)
        .trim();

    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() && v < 0.0 => None,
        Ok(v) if v.is_finite() => Some(v),
        _ => Some(0.0),
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(players: &[Player]) -> Vec<&str> {
        players.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_drops_players_below_min_salary() {
        let players = parse_csv("name,salary\nAlice,8000\nBob,3000\n", 3500.0, 120);
        assert_eq!(names(&players), vec!["Alice"]);
        assert_eq!(players[0].salary, 8000.0);
        assert_eq!(players[0].positions, vec!["UTIL"]);
        assert_eq!(players[0].player_id, "alice");
        assert_eq!(players[0].team, None);
    }

    #[test]
    fn test_sorted_by_salary_then_name() {
        let csv = "Name , Salary\nzed,5000\nAmy,7000\nbob,5000\nBob,5000\nCal,9000\n";
        let players = parse_csv(csv, 0.0, 120);
        // Case-sensitive: uppercase sorts before lowercase
        assert_eq!(names(&players), vec!["Cal", "Amy", "Bob", "bob", "zed"]);
    }

    #[test]
    fn test_truncates_to_max_players() {
        let csv = "name,salary\nA,1000\nB,2000\nC,3000\nD,4000\n";
        let players = parse_csv(csv, 0.0, 2);
        assert_eq!(names(&players), vec!["D", "C"]);

        assert!(parse_csv(csv, 0.0, 0).is_empty());
    }

    #[test]
    fn test_missing_required_columns() {
        assert!(parse_csv("player,salary\nAlice,8000\n", 0.0, 10).is_empty());
        assert!(parse_csv("name,cost\nAlice,8000\n", 0.0, 10).is_empty());
        assert!(parse_csv("", 0.0, 10).is_empty());
        assert!(parse_csv("\n  \n", 0.0, 10).is_empty());
    }

    #[test]
    fn test_positions_team_and_id() {
        let csv = "Position,Name,ID,Salary,TeamAbbrev\n pg/sg ,Alice,123,$8000,BOS\nC,Bob,,7000,\n";
        let players = parse_csv(csv, 0.0, 10);

        assert_eq!(players[0].positions, vec!["PG", "SG"]);
        assert_eq!(players[0].player_id, "123");
        assert_eq!(players[0].team.as_deref(), Some("BOS"));

        assert_eq!(players[1].positions, vec!["C"]);
        assert_eq!(players[1].player_id, "bob");
        assert_eq!(players[1].team, None);
    }

    #[test]
    fn test_positions_column_alias_and_commas() {
        let csv = "name,positions,salary\nAlice,\"PG, SF\",6000\n";
        // Quoted commas are split like any other comma; the salary shifts.
        let players = parse_csv(csv, 0.0, 10);
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].salary, 0.0);

        let csv = "name,positions,salary\nAlice,PG/SF,6000\n";
        let players = parse_csv(csv, 0.0, 10);
        assert_eq!(players[0].positions, vec!["PG", "SF"]);
    }

    #[test]
    fn test_skips_blank_names_and_short_rows() {
        let csv = "name,salary\n,9000\nAlice\nBob,5000\n\n\nCal,6000";
        let players = parse_csv(csv, 0.0, 10);
        assert_eq!(names(&players), vec!["Cal", "Bob"]);
    }

    #[test]
    fn test_unparseable_salary_is_zero() {
        let csv = "name,salary\nAlice,abc\nCal,€4500.50\nDee,inf\n";
        let players = parse_csv(csv, 0.0, 10);
        assert_eq!(names(&players), vec!["Cal", "Alice", "Dee"]);
        assert_eq!(players[0].salary, 4500.5);
        assert_eq!(players[1].salary, 0.0);
        assert_eq!(players[2].salary, 0.0);

        assert_eq!(names(&parse_csv(csv, 1.0, 10)), vec!["Cal"]);
    }

    #[test]
    fn test_negative_salary_drops_row() {
        let csv = "name,salary\nAlice,-500\nBob,$-1\nCal,3000\n";
        let players = parse_csv(csv, 0.0, 10);
        assert_eq!(names(&players), vec!["Cal"]);
        assert!(players.iter().all(|p| p.salary >= 0.0));
    }

    #[test]
    fn test_handles_crlf_and_bom() {
        let csv = "\u{feff}name,salary\r\nAlice,8000\r\n";
        let players = parse_csv(csv, 0.0, 10);
        assert_eq!(names(&players), vec!["Alice"]);
    }

    #[test]
    fn test_ordering_properties_hold() {
        let csv = "name,salary\nE,4000\nB,6000\nA,6000\nD,3500\nC,3499\nF,12000\n";
        let min_salary = 3500.0;
        let max_players = 4;
        let players = parse_csv(csv, min_salary, max_players);

        assert!(players.len() <= max_players);
        assert!(players.iter().all(|p| p.salary >= min_salary));
        for pair in players.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.salary > b.salary || (a.salary == b.salary && a.name < b.name));
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("LeBron James"), "lebron-james");
        assert_eq!(slug("  D'Angelo  Russell Jr. "), "d-angelo-russell-jr");
    }
}
