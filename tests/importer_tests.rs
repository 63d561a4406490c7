// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use bunkbook::{cli, commands::importer};
use rusqlite::Connection;
use std::io::Write;
use tempfile::NamedTempFile;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE occupancy_history(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL UNIQUE,
            total_beds INTEGER NOT NULL,
            occupied_beds INTEGER NOT NULL
        );
        "#,
    )
    .unwrap();
    conn
}

fn import(conn: &mut Connection, path: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["bunkbook", "import", "occupancy", "--path", path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(conn, import_m)
    } else {
        panic!("no import subcommand");
    }
}

#[test]
fn importer_loads_samples_and_trims_fields() {
    let mut conn = base_conn();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,total_beds,occupied_beds\n2025-06-01, 32 , 24 \n2025-06-02,32,26"
    )
    .unwrap();
    file.flush().unwrap();

    let path = format!("  {}  ", file.path().to_str().unwrap());
    import(&mut conn, &path).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM occupancy_history", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 2);
    let occupied: i64 = conn
        .query_row(
            "SELECT occupied_beds FROM occupancy_history WHERE date='2025-06-01'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(occupied, 24);
}

#[test]
fn importer_rejects_invalid_date_and_rolls_back() {
    let mut conn = base_conn();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,total_beds,occupied_beds\n2025-06-01,32,24\n2025-13-02,32,26"
    )
    .unwrap();
    file.flush().unwrap();

    let err = import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Invalid occupancy date '2025-13-02'"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM occupancy_history", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn importer_rejects_out_of_range_sample_and_rolls_back() {
    let mut conn = base_conn();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,total_beds,occupied_beds\n2025-06-01,32,24\n2025-06-02,32,33"
    )
    .unwrap();
    file.flush().unwrap();

    let err = import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Invalid occupancy sample"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM occupancy_history", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn importer_rejects_zero_bed_day() {
    let mut conn = base_conn();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,total_beds,occupied_beds\n2025-06-01,0,0").unwrap();
    file.flush().unwrap();

    let err = import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Invalid occupancy sample"));
}

#[test]
fn importer_upserts_on_duplicate_date() {
    let mut conn = base_conn();
    conn.execute(
        "INSERT INTO occupancy_history(date, total_beds, occupied_beds) VALUES('2025-06-01', 32, 10)",
        [],
    )
    .unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,total_beds,occupied_beds\n2025-06-01,40,30").unwrap();
    file.flush().unwrap();

    import(&mut conn, file.path().to_str().unwrap()).unwrap();

    let (count, total, occupied): (i64, i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), total_beds, occupied_beds FROM occupancy_history",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(total, 40);
    assert_eq!(occupied, 30);
}
